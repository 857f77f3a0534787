//! Bearer-token guards.
//!
//! Handlers take [`AuthUser`] or [`AdminUser`] as their first argument; the
//! extractor rejects the request before the handler body or any payload
//! extractor runs.

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::app::AppState;
use crate::errors::AppError;
use crate::models::user::User;

pub struct AuthUser(pub User);

pub struct AdminUser(pub User);

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|auth| auth.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                AppError::InternalServerError("Application state is not configured".to_string())
            })?;
            let token = token
                .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;
            state.users.authenticate(&token).await.map(AuthUser)
        })
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let user = AuthUser::from_request(req, payload);

        Box::pin(async move {
            let AuthUser(user) = user.await?;
            if user.is_admin {
                Ok(AdminUser(user))
            } else {
                Err(AppError::Forbidden("Not authorized as an admin".to_string()))
            }
        })
    }
}

use actix_web::{web, HttpResponse};

use crate::app::AppState;
use crate::errors::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::user::{LoginRequest, RegisterRequest, UserProfile};

pub async fn register_user(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.users.register(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

pub async fn login_user(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.users.login(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn get_user_profile(AuthUser(user): AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(UserProfile::from(&user)))
}

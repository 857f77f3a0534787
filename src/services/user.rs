use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use std::sync::Arc;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::db::UserStore;
use crate::errors::{AppError, AppResult};
use crate::models::user::{AuthResponse, LoginRequest, NewUser, RegisterRequest, User, UserProfile};
use crate::utils::jwt::JwtKeys;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn map_validation_error(err: ValidationErrors) -> AppError {
    let mut messages: Vec<String> = err
        .field_errors()
        .into_values()
        .flatten()
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string())
        })
        .collect();
    messages.sort();
    AppError::InvalidInput(messages.join(", "))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::InternalServerError("Hashing error".to_string()))
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::InternalServerError("Invalid password hash".to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(AppError::InternalServerError(err.to_string())),
    }
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    jwt: JwtKeys,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtKeys) -> Self {
        Self { store, jwt }
    }

    fn respond(&self, user: &User) -> AppResult<AuthResponse> {
        let token = self
            .jwt
            .generate_token(user.user_id)
            .map_err(|_| AppError::InternalServerError("Token generation error".to_string()))?;
        Ok(AuthResponse {
            profile: UserProfile::from(user),
            token,
        })
    }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        // Rules apply to the values that get stored, so a blank name fails `length`.
        let req = RegisterRequest {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            password: req.password,
        };
        req.validate().map_err(map_validation_error)?;

        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let user = self
            .store
            .insert_user(NewUser {
                name: req.name,
                email: req.email,
                password: hash_password(&req.password)?,
                is_admin: false,
            })
            .await?;

        log::info!("Registered user {}", user.user_id);
        self.respond(&user)
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        req.validate()
            .map_err(|_| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let user = self
            .store
            .find_user_by_email(&req.email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&req.password, &user.password)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        self.respond(&user)
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let claims = self
            .jwt
            .validate_token(token)
            .map_err(|_| AppError::Unauthorized("Not authorized, token failed".to_string()))?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;

        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not authorized, user not found".to_string()))
    }
}

pub mod employee;
pub mod user;

use actix_web::{HttpRequest, HttpResponse};

use crate::errors::AppError;

pub async fn api_root() -> &'static str {
    "API is running..."
}

pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound(format!("Not Found - {}", req.path())))
}

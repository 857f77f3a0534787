use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppError;
use crate::middleware::auth::{AdminUser, AuthUser};
use crate::services::employee::page_number;
use crate::utils::multipart::{read_employee_form, EmployeeForm};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeQueryParams {
    keyword: Option<String>,
    page_number: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

/// Uploads the form's picture, if any, and returns its reference.
async fn upload_picture(
    state: &AppState,
    form: &mut EmployeeForm,
) -> Result<Option<String>, AppError> {
    match form.picture.take() {
        Some(bytes) => Ok(Some(
            state.employees.store_picture(bytes, state.max_upload_bytes).await?,
        )),
        None => Ok(None),
    }
}

pub async fn get_employees(
    _user: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<EmployeeQueryParams>,
) -> Result<HttpResponse, AppError> {
    let page = page_number(query.page_number.as_deref());
    let result = state.employees.list(query.keyword.as_deref(), page).await?;
    Ok(HttpResponse::Ok().json(result))
}

pub async fn search_employees(
    _user: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let employees = state.employees.search(query.query.as_deref()).await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn get_employee(
    _user: AuthUser,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let employee = state.employees.get_by_id(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn create_employee(
    AuthUser(user): AuthUser,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let mut form = read_employee_form(payload, state.max_upload_bytes).await?;
    let picture = upload_picture(&state, &mut form).await?;

    let employee = state
        .employees
        .create(form.input, picture, user.user_id)
        .await?;
    Ok(HttpResponse::Created().json(employee))
}

pub async fn update_employee(
    _user: AuthUser,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    // Unknown ids are rejected before anything is uploaded.
    state.employees.get_by_id(id).await?;

    let mut form = read_employee_form(payload, state.max_upload_bytes).await?;
    let picture = upload_picture(&state, &mut form).await?;

    let employee = state.employees.update(id, form.input, picture).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn delete_employee(
    _admin: AdminUser,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    state.employees.delete(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee removed",
    })))
}

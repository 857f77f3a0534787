use actix_multipart::{Field, Multipart};
use futures_util::StreamExt;
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};
use crate::models::employee::EmployeeInput;

pub const PICTURE_FIELD: &str = "profilePicture";
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Employee fields plus the raw bytes of an optional `profilePicture` file.
#[derive(Debug, Default)]
pub struct EmployeeForm {
    pub input: EmployeeInput,
    pub picture: Option<Vec<u8>>,
}

fn invalid(err: impl std::fmt::Display) -> AppError {
    AppError::InvalidInput(format!("Invalid multipart payload: {}", err))
}

async fn read_field(field: &mut Field, limit: usize, name: &str) -> AppResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(invalid)?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::InvalidInput(format!(
                "Field `{}` exceeds {} bytes limit",
                name, limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Collects a multipart employee form.
///
/// `address` may arrive as one JSON field or as `address[street]`-style parts;
/// the parts are folded into the same JSON shape.
pub async fn read_employee_form(
    mut payload: Multipart,
    max_file_bytes: usize,
) -> AppResult<EmployeeForm> {
    let mut form = EmployeeForm::default();
    let mut address_parts = Map::new();

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(invalid)?;
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let is_file = disposition.get_filename().is_some();

        if name == PICTURE_FIELD {
            let bytes = read_field(&mut field, max_file_bytes, &name).await?;
            if !bytes.is_empty() {
                form.picture = Some(bytes);
            }
            continue;
        }

        let bytes = read_field(&mut field, MAX_TEXT_FIELD_BYTES, &name).await?;
        if is_file {
            log::warn!("Ignoring unexpected file field `{}`", name);
            continue;
        }
        let value = String::from_utf8(bytes)
            .map_err(|_| AppError::InvalidInput(format!("Field `{}` is not valid UTF-8", name)))?;

        if let Some(part) = name
            .strip_prefix("address[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            address_parts.insert(part.to_string(), Value::String(value));
        } else if !form.input.set(&name, value) {
            log::debug!("Ignoring unknown form field `{}`", name);
        }
    }

    if form.input.address.is_none() && !address_parts.is_empty() {
        form.input.address = Some(Value::Object(address_parts).to_string());
    }
    Ok(form)
}

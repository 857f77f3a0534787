#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use employee_directory::app::AppState;
use employee_directory::db::{MemoryStore, UserStore};
use employee_directory::errors::{AppError, AppResult};
use employee_directory::models::employee::EmployeeInput;
use employee_directory::models::user::{NewUser, User};
use employee_directory::services::assets::{AssetStore, CheckedImage};
use employee_directory::utils::jwt::JwtKeys;

pub const BOUNDARY: &str = "----employee-directory-test-boundary";
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;

pub const PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, // signature
    0, 0, 0, 13, b'I', b'H', b'D', b'R', // IHDR
    0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0, 0x90, 0x77, 0x53, 0xDE,
    0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82,
];

/// Asset host double that remembers every call.
#[derive(Default)]
pub struct RecordingAssets {
    pub uploads: Mutex<Vec<String>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail_deletes: bool,
}

impl RecordingAssets {
    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetStore for RecordingAssets {
    async fn upload(&self, image: CheckedImage) -> AppResult<String> {
        let reference = format!(
            "https://assets.test/employee_profiles/{}.{}",
            image.id, image.extension
        );
        self.uploads.lock().unwrap().push(reference.clone());
        Ok(reference)
    }

    async fn delete(&self, asset_id: &str) -> AppResult<()> {
        self.deletes.lock().unwrap().push(asset_id.to_string());
        if self.fail_deletes {
            Err(AppError::AssetError("asset host unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub store: Arc<MemoryStore>,
    pub assets: Arc<RecordingAssets>,
    pub jwt: JwtKeys,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_assets(RecordingAssets::default())
    }

    pub fn with_failing_deletes() -> Self {
        Self::with_assets(RecordingAssets {
            fail_deletes: true,
            ..Default::default()
        })
    }

    fn with_assets(assets: RecordingAssets) -> Self {
        let store = Arc::new(MemoryStore::new());
        let assets = Arc::new(assets);
        let jwt = JwtKeys::new("test-secret", 1);
        let state = AppState::new(store.clone(), assets.clone(), jwt.clone(), MAX_UPLOAD_BYTES);
        Self {
            state: web::Data::new(state),
            store,
            assets,
            jwt,
        }
    }

    /// Inserts a user straight into the store and returns it with a valid token.
    pub async fn user(&self, email: &str, is_admin: bool) -> (User, String) {
        let user = self
            .store
            .insert_user(NewUser {
                name: "Test User".to_string(),
                email: email.to_string(),
                password: "not-a-real-hash".to_string(),
                is_admin,
            })
            .await
            .unwrap();
        let token = self.jwt.generate_token(user.user_id).unwrap();
        (user, token)
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub const ADDRESS_JSON: &str =
    r#"{"street":"1 Rd","city":"C","state":"S","zipCode":"000","country":"India"}"#;

/// The canonical create payload, as wire-named form fields.
pub fn ada_fields(email: &str) -> Vec<(&'static str, String)> {
    vec![
        ("firstName", "Ada".to_string()),
        ("lastName", "Lovelace".to_string()),
        ("email", email.to_string()),
        ("phone", "123".to_string()),
        ("department", "Eng".to_string()),
        ("position", "Engineer".to_string()),
        ("joinDate", "2024-01-01".to_string()),
        ("salary", "50000".to_string()),
        ("address", ADDRESS_JSON.to_string()),
    ]
}

pub fn input_from(fields: &[(&str, String)]) -> EmployeeInput {
    let mut input = EmployeeInput::default();
    for (name, value) in fields {
        assert!(input.set(name, value.clone()), "unknown field {}", name);
    }
    input
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn multipart_body(fields: &[(&str, String)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                concat!(
                    "--{}\r\n",
                    "Content-Disposition: form-data; name=\"profilePicture\"; filename=\"{}\"\r\n",
                    "Content-Type: application/octet-stream\r\n\r\n",
                ),
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

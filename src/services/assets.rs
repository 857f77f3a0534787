//! Profile picture storage.
//!
//! References stored on employees are URLs (S3) or `/uploads/...` paths
//! (local). The asset host addresses files by the reference's file stem, so
//! every reference can be turned back into an id with [`asset_id`].

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::path::PathBuf;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::employee::DEFAULT_PROFILE_PICTURE;

const S3_FOLDER: &str = "employee_profiles";
pub const UPLOADS_ROUTE: &str = "/uploads";
const LOCAL_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// An uploaded image that passed the type and size checks.
#[derive(Debug, Clone)]
pub struct CheckedImage {
    pub id: String,
    pub extension: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Accepts JPEG and PNG payloads up to `max_bytes`.
pub fn check_image(bytes: Vec<u8>, max_bytes: usize) -> AppResult<CheckedImage> {
    if bytes.is_empty() {
        return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::InvalidInput(format!(
            "File size exceeds {} bytes limit",
            max_bytes
        )));
    }

    let (extension, mime_type) = match infer::get(&bytes).map(|kind| kind.mime_type()) {
        Some("image/jpeg") => ("jpg", "image/jpeg"),
        Some("image/png") => ("png", "image/png"),
        _ => {
            return Err(AppError::InvalidInput(
                "Only JPEG and PNG files are allowed".to_string(),
            ))
        }
    };

    Ok(CheckedImage {
        id: Uuid::new_v4().to_string(),
        extension,
        mime_type,
        bytes,
    })
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores the image and returns the reference to keep on the record.
    async fn upload(&self, image: CheckedImage) -> AppResult<String>;

    async fn delete(&self, asset_id: &str) -> AppResult<()>;
}

pub fn is_custom(reference: &str) -> bool {
    !reference.is_empty() && reference != DEFAULT_PROFILE_PICTURE
}

/// File stem of the last path segment: `https://h/a/b/abc.jpg?x=1` → `abc`.
pub fn asset_id(reference: &str) -> String {
    let path = match url::Url::parse(reference) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.last().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => reference
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    path.split('.').next().unwrap_or_default().to_string()
}

/// Best-effort removal of a superseded picture. Failures are logged, never returned.
pub async fn discard(store: &dyn AssetStore, reference: &str) {
    if !is_custom(reference) {
        return;
    }
    let id = asset_id(reference);
    match store.delete(&id).await {
        Ok(()) => log::info!("Deleted profile picture {}", id),
        Err(err) => log::error!("Error deleting profile picture {}: {}", reference, err),
    }
}

pub struct S3AssetStore {
    client: S3Client,
    bucket: String,
}

impl S3AssetStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    fn key(asset_id: &str) -> String {
        format!("{}/{}", S3_FOLDER, asset_id)
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn upload(&self, image: CheckedImage) -> AppResult<String> {
        let key = Self::key(&image.id);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(image.mime_type)
            .body(ByteStream::from(image.bytes))
            .send()
            .await
            .map_err(|err| AppError::AssetError(format!("Failed to upload file: {}", err)))?;

        Ok(format!("https://{}.s3.amazonaws.com/{}", self.bucket, key))
    }

    async fn delete(&self, asset_id: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(Self::key(asset_id))
            .send()
            .await
            .map_err(|err| AppError::AssetError(format!("Failed to delete file: {}", err)))?;
        Ok(())
    }
}

/// Keeps pictures on disk under the directory served at `/uploads`.
pub struct LocalAssetStore {
    dir: PathBuf,
}

impl LocalAssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn safe_id(asset_id: &str) -> AppResult<&str> {
    if !asset_id.is_empty()
        && asset_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(asset_id)
    } else {
        Err(AppError::AssetError(format!("Invalid asset id `{}`", asset_id)))
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn upload(&self, image: CheckedImage) -> AppResult<String> {
        let file_name = format!("{}.{}", safe_id(&image.id)?, image.extension);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| AppError::AssetError(err.to_string()))?;
        tokio::fs::write(self.dir.join(&file_name), &image.bytes)
            .await
            .map_err(|err| AppError::AssetError(err.to_string()))?;

        Ok(format!("{}/{}", UPLOADS_ROUTE, file_name))
    }

    async fn delete(&self, asset_id: &str) -> AppResult<()> {
        let asset_id = safe_id(asset_id)?;
        for extension in LOCAL_EXTENSIONS {
            let path = self.dir.join(format!("{}.{}", asset_id, extension));
            match tokio::fs::remove_file(&path).await {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(AppError::AssetError(err.to_string())),
            }
        }
        Err(AppError::AssetError(format!("Asset `{}` not found", asset_id)))
    }
}

//! Photo storage abstraction for report attachments.
//!
//! Reports carry 1-3 photos submitted as base64 data URIs. The storage
//! backend persists the decoded bytes and hands back a public URL; the
//! local filesystem backend is the default deployment target.

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::{AppError, AppResult};

/// Image MIME types accepted for report photos.
pub const ACCEPTED_PHOTO_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// A decoded photo payload.
#[derive(Debug, Clone)]
pub struct DecodedPhoto {
    /// MIME content type.
    pub content_type: String,
    /// Decoded image bytes.
    pub bytes: Vec<u8>,
}

/// Decode a base64 data URI into photo bytes.
///
/// Accepts `data:<mime>;base64,<payload>` where `<mime>` is one of
/// [`ACCEPTED_PHOTO_TYPES`].
pub fn decode_photo_data_uri(data_uri: &str) -> AppResult<DecodedPhoto> {
    let rest = data_uri.strip_prefix("data:").ok_or_else(|| {
        AppError::BadRequest("Photo must be a base64 data URI".to_string())
    })?;

    let (content_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| AppError::BadRequest("Photo must be base64 encoded".to_string()))?;

    if !ACCEPTED_PHOTO_TYPES.contains(&content_type) {
        return Err(AppError::BadRequest(format!(
            "Unsupported photo type: {content_type}"
        )));
    }

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|_| AppError::BadRequest("Photo payload is not valid base64".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::BadRequest("Photo payload is empty".to_string()));
    }

    Ok(DecodedPhoto {
        content_type: content_type.to_string(),
        bytes,
    })
}

/// Storage backend trait for report photos.
#[async_trait::async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Persist a photo for a report and return its public URL.
    async fn upload_photo(&self, report_id: i64, photo: &DecodedPhoto) -> AppResult<String>;

    /// Delete every stored photo belonging to a report.
    async fn delete_report_photos(&self, report_id: i64) -> AppResult<()>;
}

/// Local filesystem photo storage.
pub struct LocalPhotoStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalPhotoStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self { base_path, base_url }
    }

    fn extension(content_type: &str) -> &'static str {
        match content_type {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

#[async_trait::async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn upload_photo(&self, report_id: i64, photo: &DecodedPhoto) -> AppResult<String> {
        let key = format!(
            "{report_id}/{}.{}",
            uuid::Uuid::new_v4(),
            Self::extension(&photo.content_type)
        );
        let path = self.base_path.join(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, &photo.bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write photo: {e}")))?;

        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }

    async fn delete_report_photos(&self, report_id: i64) -> AppResult<()> {
        let dir = self.base_path.join(report_id.to_string());
        if dir.exists() {
            tokio::fs::remove_dir_all(&dir)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete photos: {e}")))?;
        }
        Ok(())
    }
}

use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to persist image file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct StoredImageFile {
    pub storage_path: String,
    pub public_url: String,
    pub mime_type: String,
    pub file_size_bytes: i32,
}

/// Persists uploaded binary files and hands back a stable public URL.
/// IO failures are fatal to the caller and never retried here.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn save(
        &self,
        property_id: Uuid,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredImageFile, StorageError>;
}

/// Writes files under `<content_root>/uploads/properties/<property_id>/`
/// and derives the public URL from the relative path. No content
/// validation happens here; the endpoint layer owns that.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    content_root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save(
        &self,
        property_id: Uuid,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredImageFile, StorageError> {
        let extension = resolve_extension(content_type);
        let file_name = format!("{}{}", Uuid::new_v4().simple(), extension);
        let relative_dir = format!("uploads/properties/{}", property_id.simple());
        let absolute_dir = self.content_root.join(&relative_dir);
        tokio::fs::create_dir_all(&absolute_dir).await?;

        let file_size_bytes = bytes.len() as i32;
        tokio::fs::write(absolute_dir.join(&file_name), &bytes).await?;

        let storage_path = format!("{relative_dir}/{file_name}");
        Ok(StoredImageFile {
            public_url: format!("/{storage_path}"),
            storage_path,
            mime_type: content_type.to_string(),
            file_size_bytes,
        })
    }
}

fn resolve_extension(content_type: &str) -> &'static str {
    match content_type.to_lowercase().as_str() {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/webp" => ".webp",
        _ => ".bin",
    }
}

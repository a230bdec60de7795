//! Proof-of-payment image storage. Images are opaque blobs addressed by a
//! reference string stored on the order.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported content type {0}")]
    UnsupportedType(String),
    #[error("image is empty")]
    Empty,
    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("invalid proof reference")]
    InvalidReference,
    #[error("storage i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => AppError::Internal(anyhow::Error::new(e).context("proof storage")),
            other => AppError::Validation(other.to_string()),
        }
    }
}

#[async_trait]
pub trait ProofStore: Send + Sync {
    /// Persist an image and return its opaque reference.
    async fn save(&self, order_id: Uuid, content_type: &str, image: &[u8]) -> Result<String, StorageError>;

    async fn load(&self, reference: &str) -> Result<Vec<u8>, StorageError>;
}

/// Map an accepted image mimetype to the file extension it is stored under.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Stores proofs under `<root>/<order_id>/<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct LocalProofStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalProofStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(reference);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidReference);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ProofStore for LocalProofStore {
    async fn save(&self, order_id: Uuid, content_type: &str, image: &[u8]) -> Result<String, StorageError> {
        let ext = extension_for(content_type)
            .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))?;
        if image.is_empty() {
            return Err(StorageError::Empty);
        }
        if image.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: image.len(),
                limit: self.max_bytes,
            });
        }

        let reference = format!("{order_id}/{}.{ext}", Uuid::new_v4());
        let path = self.root.join(&reference);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, image).await?;
        tracing::debug!(%order_id, reference = %reference, bytes = image.len(), "proof stored");
        Ok(reference)
    }

    async fn load(&self, reference: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(reference)?;
        Ok(tokio::fs::read(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_content_types() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("IMAGE/JPEG; charset=binary"), Some("jpg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[tokio::test]
    async fn save_then_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = LocalProofStore::new(dir.path(), 16);
        let order_id = Uuid::new_v4();

        let reference = store.save(order_id, "image/png", b"png-bytes").await?;
        assert!(reference.starts_with(&order_id.to_string()));
        assert!(reference.ends_with(".png"));
        assert_eq!(store.load(&reference).await?, b"png-bytes");
        Ok(())
    }

    #[tokio::test]
    async fn rejects_bad_uploads() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = LocalProofStore::new(dir.path(), 4);
        let order_id = Uuid::new_v4();

        assert!(matches!(
            store.save(order_id, "image/png", b"").await,
            Err(StorageError::Empty)
        ));
        assert!(matches!(
            store.save(order_id, "image/png", b"too large").await,
            Err(StorageError::TooLarge { size: 9, limit: 4 })
        ));
        assert!(matches!(
            store.save(order_id, "text/plain", b"ok").await,
            Err(StorageError::UnsupportedType(_))
        ));
        assert!(matches!(
            store.load("../etc/passwd").await,
            Err(StorageError::InvalidReference)
        ));
        Ok(())
    }
}

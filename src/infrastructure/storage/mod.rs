use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub mod s3;

pub use s3::StorageService;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not open {path} for upload: {reason}")]
    Source { path: String, reason: String },

    #[error("object store rejected put of {key}: {reason}")]
    Put { key: String, reason: String },
}

/// Remote bucket the processed videos are published to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads the whole file as one object. A failed call leaves no object
    /// behind under `key`.
    async fn put_file(&self, key: &str, content_type: &str, path: &Path) -> Result<(), StorageError>;

    /// Public URL readers use to fetch `key`.
    fn public_url(&self, key: &str) -> String;
}

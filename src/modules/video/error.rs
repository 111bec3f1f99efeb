use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;

use crate::common::random::EntropyError;
use crate::common::response::ApiError;
use crate::common::upload::StageError;
use crate::infrastructure::media::{ProbeError, RemuxError};
use crate::infrastructure::storage::StorageError;

/// Last state an upload reached. `Published` is the only successful end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Staged,
    Probed,
    Classified,
    Remuxed,
    Uploaded,
    Published,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Staged => "staged",
            Stage::Probed => "probed",
            Stage::Classified => "classified",
            Stage::Remuxed => "remuxed",
            Stage::Uploaded => "uploaded",
            Stage::Published => "published",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    Invalid(String),

    #[error("upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Video not found")]
    NotFound,

    #[error("Unable to retrieve video metadata: {0:#}")]
    Lookup(anyhow::Error),

    #[error("Error staging upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Error determining aspect ratio: {0}")]
    Probe(#[from] ProbeError),

    #[error("Error processing video for fast start: {0}")]
    Remux(#[from] RemuxError),

    #[error("Error generating storage name: {0}")]
    Entropy(#[from] EntropyError),

    #[error("Error uploading to object storage: {0}")]
    Upload(#[from] StorageError),

    #[error("Error updating video record: {0:#}")]
    Store(anyhow::Error),
}

impl IngestError {
    /// True for the request-level refusals that happen before any work.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            IngestError::Invalid(_)
                | IngestError::PayloadTooLarge { .. }
                | IngestError::Unauthorized(_)
                | IngestError::NotFound
        )
    }

    /// The state the upload was in when this error stopped it.
    pub fn stage(&self) -> Stage {
        match self {
            IngestError::Invalid(_)
            | IngestError::PayloadTooLarge { .. }
            | IngestError::Unauthorized(_)
            | IngestError::NotFound
            | IngestError::Lookup(_)
            | IngestError::Staging(_) => Stage::Received,
            IngestError::Probe(_) => Stage::Staged,
            IngestError::Remux(_) => Stage::Classified,
            IngestError::Entropy(_) | IngestError::Upload(_) => Stage::Remuxed,
            IngestError::Store(_) => Stage::Uploaded,
        }
    }

    /// Text for the response body. Repository errors carry driver detail,
    /// which only goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            IngestError::Lookup(_) => "Unable to retrieve video metadata".to_string(),
            IngestError::Store(_) => "Error updating video record".to_string(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::Invalid(_) | IngestError::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            IngestError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            IngestError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StageError> for IngestError {
    fn from(e: StageError) -> Self {
        match e {
            StageError::TooLarge { limit } => IngestError::PayloadTooLarge { limit },
            StageError::Body(reason) => IngestError::Invalid(format!("Unable to read upload: {}", reason)),
            StageError::Io(e) => IngestError::Staging(e),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        ApiError(e.public_message(), e.status())
    }
}

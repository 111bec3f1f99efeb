use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use futures_util::StreamExt;
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StageError {
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("could not read upload body: {0}")]
    Body(String),

    #[error("could not write temporary file: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw upload bytes on local disk. The file is removed when this is dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    len: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    /// Moves the file to `dest` for good. Same-filesystem rename only.
    pub fn persist(self, dest: &Path) -> std::io::Result<()> {
        self.path.persist(dest).map_err(|e| e.error)
    }
}

/// Output of the fast-start remux. Removed on drop, like [`StagedFile`].
#[derive(Debug)]
pub struct RemuxedFile {
    path: TempPath,
}

impl RemuxedFile {
    /// Takes ownership of `path`; whatever ends up there is deleted on drop.
    pub fn claim(path: PathBuf) -> Self {
        Self {
            path: TempPath::from_path(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Normalized `type/subtype` of `declared` if it is one of `accepted`.
/// Parameters such as `; codecs=...` are ignored.
pub fn media_type_in(declared: Option<&str>, accepted: &[&str]) -> Option<String> {
    let parsed: mime::Mime = declared?.trim().parse().ok()?;
    let essence = parsed.essence_str().to_ascii_lowercase();
    accepted.contains(&essence.as_str()).then_some(essence)
}

/// Temp names for uploads staged outside any served directory.
pub const UPLOAD_PREFIX: &str = "upload-";

/// Temp names for uploads staged inside a served directory. Dot files are
/// never served, so a half-written file can't be fetched.
pub const HIDDEN_UPLOAD_PREFIX: &str = ".upload-";

/// Streams a multipart field into a fresh `<prefix>XXXXXX<suffix>` temp file
/// under `dir`.
///
/// Chunks are counted as they arrive, so an oversized body is cut off at the
/// first chunk that crosses `limit` instead of being read to the end.
pub async fn stage_field(
    mut field: Field<'_>,
    dir: &Path,
    prefix: &str,
    suffix: &str,
    limit: u64,
) -> Result<StagedFile, StageError> {
    let named = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(dir)?;
    let (file, path) = named.into_parts();
    let mut file = tokio::fs::File::from_std(file);
    let mut written: u64 = 0;

    while let Some(chunk) = field.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                warn!("Upload stream interrupted: {}", e);
                return Err(StageError::Body(e.body_text()));
            }
        };

        written += chunk.len() as u64;
        if written > limit {
            return Err(StageError::TooLarge { limit });
        }

        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    debug!(path = %path.display(), bytes = written, "upload staged");
    Ok(StagedFile { path, len: written })
}

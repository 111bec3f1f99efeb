use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::Remuxer;
use crate::common::upload::RemuxedFile;

#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("failed to run ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ffmpeg exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("ffmpeg did not produce {0}")]
    MissingOutput(PathBuf),
}

/// `/tmp/upload-x1y2.mp4` -> `/tmp/upload-x1y2.processing.mp4`
pub fn fast_start_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match input.extension() {
        Some(ext) => format!("{}.processing.{}", stem, ext.to_string_lossy()),
        None => format!("{}.processing", stem),
    };
    input.with_file_name(name)
}

#[derive(Clone, Debug)]
pub struct FfmpegRemuxer {
    binary: String,
}

impl FfmpegRemuxer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, input: &Path) -> Result<RemuxedFile, RemuxError> {
        // Claimed before ffmpeg starts so a half-written output is removed too.
        let output = RemuxedFile::claim(fast_start_path(input));

        let result = Command::new(&self.binary)
            .args(["-nostdin", "-v", "error", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4", "-y"])
            .arg(output.path())
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !result.status.success() {
            return Err(RemuxError::Exit {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(output.path()).await.unwrap_or(false) {
            return Err(RemuxError::MissingOutput(output.path().to_path_buf()));
        }

        debug!(input = %input.display(), output = %output.path().display(), "ffmpeg remux finished");
        Ok(output)
    }
}

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::{MediaProber, StreamInfo};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run ffprobe: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ffprobe exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("malformed ffprobe output: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("no video streams found")]
    NoStreams,

    #[error("first video stream has no usable dimensions")]
    MissingDimensions,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Parses `ffprobe -print_format json -show_streams` output.
pub fn parse_probe_output(stdout: &[u8]) -> Result<StreamInfo, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;
    let stream = output.streams.first().ok_or(ProbeError::NoStreams)?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Ok(StreamInfo { width, height }),
        _ => Err(ProbeError::MissingDimensions),
    }
}

#[derive(Clone, Debug)]
pub struct FfprobeProber {
    binary: String,
}

impl FfprobeProber {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<StreamInfo, ProbeError> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ProbeError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let info = parse_probe_output(&output.stdout)?;
        debug!(path = %path.display(), width = info.width, height = info.height, "ffprobe finished");
        Ok(info)
    }
}

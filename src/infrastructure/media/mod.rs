//! External media tooling.
//!
//! The upload pipeline only talks to [`MediaProber`] and [`Remuxer`]; the
//! ffprobe / ffmpeg backed implementations live in the submodules so tests
//! can swap in fakes without spawning processes.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::common::upload::RemuxedFile;

pub mod ffmpeg;
pub mod ffprobe;

pub use ffmpeg::{FfmpegRemuxer, RemuxError};
pub use ffprobe::{FfprobeProber, ProbeError};

/// Pixel dimensions of the first video stream of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<StreamInfo, ProbeError>;
}

#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Writes a fast-start copy of `input` next to it. `input` is left as is.
    async fn remux(&self, input: &Path) -> Result<RemuxedFile, RemuxError>;
}

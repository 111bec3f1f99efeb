use std::path::PathBuf;

use serde::Deserialize;
use crate::config::env::{self, EnvKey};

/// Largest accepted video payload unless `MAX_UPLOAD_BYTES` says otherwise.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1 << 30;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub s3_public_host: String,
    pub assets_root: PathBuf,
    pub upload_temp_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub public_base_url: String,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        let server_port = env::get_parsed(EnvKey::ServerPort, 8091);
        let s3_region = env::get_or(EnvKey::S3Region, "us-east-1");
        let s3_public_host = env::get_opt(EnvKey::S3PublicHost)
            .unwrap_or_else(|| format!("s3.{}.amazonaws.com", s3_region));
        let upload_temp_dir = env::get_opt(EnvKey::UploadTempDir)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let public_base_url = env::get_opt(EnvKey::PublicBaseUrl)
            .unwrap_or_else(|| format!("http://localhost:{}", server_port));

        Ok(Self {
            server_port,
            database_url: env::get(EnvKey::DatabaseUrl)?,
            database_max_connections: env::get_parsed(EnvKey::DatabaseMaxConnections, 20),
            jwt_secret: env::get(EnvKey::JwtSecret)?,
            s3_bucket: env::get(EnvKey::S3Bucket)?,
            s3_region,
            s3_endpoint: env::get_opt(EnvKey::S3Endpoint),
            s3_access_key: env::get(EnvKey::S3AccessKey)?,
            s3_secret_key: env::get(EnvKey::S3SecretKey)?,
            s3_public_host,
            assets_root: PathBuf::from(env::get_or(EnvKey::AssetsRoot, "./assets")),
            upload_temp_dir,
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, DEFAULT_MAX_UPLOAD_BYTES),
            ffprobe_path: env::get_or(EnvKey::FfprobePath, "ffprobe"),
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

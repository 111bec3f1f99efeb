use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    DatabaseMaxConnections,
    JwtSecret,
    S3Bucket,
    S3Region,
    S3Endpoint,
    S3AccessKey,
    S3SecretKey,
    S3PublicHost,
    AssetsRoot,
    UploadTempDir,
    MaxUploadBytes,
    FfprobePath,
    FfmpegPath,
    PublicBaseUrl,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::DatabaseMaxConnections => "DATABASE_MAX_CONNECTIONS",
            EnvKey::JwtSecret => "JWT_SECRET",
            EnvKey::S3Bucket => "S3_BUCKET",
            EnvKey::S3Region => "S3_REGION",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::S3AccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::S3SecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::S3PublicHost => "S3_PUBLIC_HOST",
            EnvKey::AssetsRoot => "ASSETS_ROOT",
            EnvKey::UploadTempDir => "UPLOAD_TEMP_DIR",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::PublicBaseUrl => "PUBLIC_BASE_URL",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

/// Unset and empty variables are both treated as absent.
pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    get_opt(key).unwrap_or_else(|| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

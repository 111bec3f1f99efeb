//! In-memory collaborators and request helpers for router-level tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
use tempfile::TempDir;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::upload::RemuxedFile;
use crate::config::settings::{AppConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::infrastructure::media::ffmpeg::fast_start_path;
use crate::infrastructure::media::{MediaProber, ProbeError, RemuxError, Remuxer, StreamInfo};
use crate::infrastructure::storage::{ObjectStore, StorageError};
use crate::middleware::auth::TokenClaims;
use crate::modules::video::model::{NewVideo, VideoRecord};
use crate::modules::video::repository::VideoRepository;
use crate::state::AppState;

pub const JWT_SECRET: &str = "test-secret";
pub const BOUNDARY: &str = "X-TUBECAST-BOUNDARY";
pub const REMUX_MARKER: &[u8] = b"faststart:";

#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Shared call log, used to assert ordering across fakes.
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeVideos {
    records: Mutex<HashMap<Uuid, VideoRecord>>,
    updates: AtomicUsize,
    fail_updates: AtomicBool,
    fail_creates: AtomicBool,
    events: Events,
}

impl FakeVideos {
    pub fn new(events: Events) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            updates: AtomicUsize::new(0),
            fail_updates: AtomicBool::new(false),
            fail_creates: AtomicBool::new(false),
            events,
        }
    }

    pub fn seed(&self, user_id: Uuid) -> VideoRecord {
        let now = OffsetDateTime::now_utc();
        let record = VideoRecord {
            id: Uuid::new_v4(),
            user_id,
            title: "Boots demo".to_string(),
            description: String::new(),
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().insert(record.id, record.clone());
        record
    }

    pub fn stored(&self, id: Uuid) -> Option<VideoRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    /// Changes a stored record behind the service's back.
    pub fn edit(&self, id: Uuid, change: impl FnOnce(&mut VideoRecord)) {
        if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
            change(record);
        }
    }

    fn set_column(
        &self,
        column: &str,
        id: Uuid,
        updated_at: OffsetDateTime,
        change: impl FnOnce(&mut VideoRecord),
    ) -> anyhow::Result<VideoRecord> {
        self.events.push(format!("{}:{}", column, id));
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(anyhow!("connection reset by peer (db.internal:5432)"));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Video {} no longer exists", id))?;
        change(record);
        record.updated_at = updated_at;
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }
}

#[async_trait]
impl VideoRepository for FakeVideos {
    async fn create(&self, video: NewVideo) -> anyhow::Result<VideoRecord> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(anyhow!("pool timed out while waiting for an open connection"));
        }
        let now = OffsetDateTime::now_utc();
        let record = VideoRecord {
            id: Uuid::new_v4(),
            user_id: video.user_id,
            title: video.title,
            description: video.description,
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<VideoRecord>> {
        Ok(self.stored(id))
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<VideoRecord>> {
        let mut records: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn set_video_url(&self, id: Uuid, url: &str, updated_at: OffsetDateTime) -> anyhow::Result<VideoRecord> {
        self.set_column("set_video_url", id, updated_at, |r| r.video_url = Some(url.to_string()))
    }

    async fn set_thumbnail_url(&self, id: Uuid, url: &str, updated_at: OffsetDateTime) -> anyhow::Result<VideoRecord> {
        self.set_column("set_thumbnail_url", id, updated_at, |r| r.thumbnail_url = Some(url.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Default)]
pub struct FakeStore {
    objects: Mutex<Vec<StoredObject>>,
    fail: AtomicBool,
    events: Events,
}

impl FakeStore {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn fail_puts(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn put_file(&self, key: &str, content_type: &str, path: &Path) -> Result<(), StorageError> {
        self.events.push(format!("put:{}", key));
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Put {
                key: key.to_string(),
                reason: "service unavailable".to_string(),
            });
        }
        let body = tokio::fs::read(path).await.map_err(|e| StorageError::Source {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.objects.lock().unwrap().push(StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://test-bucket.s3.us-east-1.amazonaws.com/{}", key)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Probe {
    Dimensions(u32, u32),
    NoStreams,
    Crash,
}

pub struct FakeProber {
    behaviour: Mutex<Probe>,
    calls: AtomicUsize,
    events: Events,
}

impl FakeProber {
    pub fn new(events: Events) -> Self {
        Self {
            behaviour: Mutex::new(Probe::Dimensions(1920, 1080)),
            calls: AtomicUsize::new(0),
            events,
        }
    }

    pub fn set(&self, behaviour: Probe) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, path: &Path) -> Result<StreamInfo, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.events.push("probe");
        assert!(path.exists(), "probed a file that is not staged");

        let behaviour = *self.behaviour.lock().unwrap();
        match behaviour {
            Probe::Dimensions(width, height) => Ok(StreamInfo { width, height }),
            Probe::NoStreams => Err(ProbeError::NoStreams),
            Probe::Crash => Err(ProbeError::Exit {
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            }),
        }
    }
}

/// Copies the input to the fast-start path with [`REMUX_MARKER`] in front.
pub struct FakeRemuxer {
    fail: AtomicBool,
    calls: AtomicUsize,
    inputs: Mutex<Vec<PathBuf>>,
    during_run: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    events: Events,
}

impl FakeRemuxer {
    pub fn new(events: Events) -> Self {
        Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            during_run: Mutex::new(None),
            events,
        }
    }

    /// Runs `hook` once, in the middle of the next remux.
    pub fn during_next_run(&self, hook: impl FnOnce() + Send + 'static) {
        *self.during_run.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn fail_runs(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<PathBuf> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Remuxer for FakeRemuxer {
    async fn remux(&self, input: &Path) -> Result<RemuxedFile, RemuxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_path_buf());
        self.events.push("remux");
        let hook = self.during_run.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }

        let output = RemuxedFile::claim(fast_start_path(input));
        if self.fail.load(Ordering::SeqCst) {
            // Leave a partial output behind, like a tool dying halfway.
            tokio::fs::write(output.path(), b"partial").await?;
            return Err(RemuxError::Exit {
                status: "exit status: 1".to_string(),
                stderr: "moov atom not found".to_string(),
            });
        }

        let mut body = REMUX_MARKER.to_vec();
        body.extend(tokio::fs::read(input).await?);
        tokio::fs::write(output.path(), body).await?;
        Ok(output)
    }
}

pub fn test_config(upload_dir: &Path, assets_dir: &Path, max_upload_bytes: u64) -> AppConfig {
    AppConfig {
        server_port: 8091,
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.to_string(),
        s3_bucket: "test-bucket".to_string(),
        s3_region: "us-east-1".to_string(),
        s3_endpoint: None,
        s3_access_key: "test".to_string(),
        s3_secret_key: "test".to_string(),
        s3_public_host: "s3.us-east-1.amazonaws.com".to_string(),
        assets_root: assets_dir.to_path_buf(),
        upload_temp_dir: upload_dir.to_path_buf(),
        max_upload_bytes,
        ffprobe_path: "ffprobe".to_string(),
        ffmpeg_path: "ffmpeg".to_string(),
        public_base_url: "http://localhost:8091".to_string(),
    }
}

pub fn token_for(user_id: Uuid) -> String {
    let now = get_current_timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id,
        iat: now,
        exp: now + 3600,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub body: &'a [u8],
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, part.file_name
            )
            .as_bytes(),
        );
        out.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        out.extend_from_slice(part.body);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    out
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn record(&self) -> VideoRecord {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// A router wired to fakes, with its own upload and assets directories.
pub struct Harness {
    pub app: Router,
    pub videos: Arc<FakeVideos>,
    pub store: Arc<FakeStore>,
    pub prober: Arc<FakeProber>,
    pub remuxer: Arc<FakeRemuxer>,
    pub events: Events,
    pub upload_dir: TempDir,
    pub assets_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn with_limit(max_upload_bytes: u64) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let assets_dir = tempfile::tempdir().unwrap();
        let events = Events::default();

        let videos = Arc::new(FakeVideos::new(events.clone()));
        let store = Arc::new(FakeStore::new(events.clone()));
        let prober = Arc::new(FakeProber::new(events.clone()));
        let remuxer = Arc::new(FakeRemuxer::new(events.clone()));

        let state = AppState::new(
            test_config(upload_dir.path(), assets_dir.path(), max_upload_bytes),
            videos.clone(),
            store.clone(),
            prober.clone(),
            remuxer.clone(),
        );

        Self {
            app: crate::app::create_app(state),
            videos,
            store,
            prober,
            remuxer,
            events,
            upload_dir,
            assets_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Response { status, headers, body }
    }

    pub async fn upload(&self, path: &str, token: Option<&str>, parts: &[Part<'_>]) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(request.body(Body::from(multipart_body(parts))).unwrap()).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = Request::builder().method("GET").uri(path);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, path: &str, token: &str, body: serde_json::Value) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub fn staged_files(&self) -> Vec<String> {
        file_names(self.upload_dir.path())
    }
}

use axum::extract::Multipart;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::aspect::{Orientation, classify};
use super::dto::CreateVideoRequest;
use super::error::{IngestError, Stage};
use super::model::{NewVideo, VideoRecord};
use super::storage_key::{StorageKey, VIDEO_EXTENSION};
use crate::common::upload::{RemuxedFile, StagedFile, UPLOAD_PREFIX, media_type_in, stage_field};
use crate::infrastructure::media::StreamInfo;
use crate::state::AppState;

pub const VIDEO_FIELD: &str = "video";
pub const ACCEPTED_VIDEO_TYPES: &[&str] = &["video/mp4"];

/// One upload, moving forward a state at a time. Each variant owns exactly
/// the resources that are still alive at that point, so dropping the value
/// on any error path releases every temp file it holds.
enum Pipeline {
    Staged(StagedFile),
    Probed {
        staged: StagedFile,
        info: StreamInfo,
    },
    Classified {
        staged: StagedFile,
        orientation: Orientation,
    },
    Remuxed {
        staged: StagedFile,
        remuxed: RemuxedFile,
        orientation: Orientation,
    },
    Uploaded {
        key: StorageKey,
    },
    Published(VideoRecord),
}

impl Pipeline {
    fn stage(&self) -> Stage {
        match self {
            Pipeline::Staged(_) => Stage::Staged,
            Pipeline::Probed { .. } => Stage::Probed,
            Pipeline::Classified { .. } => Stage::Classified,
            Pipeline::Remuxed { .. } => Stage::Remuxed,
            Pipeline::Uploaded { .. } => Stage::Uploaded,
            Pipeline::Published(_) => Stage::Published,
        }
    }
}

/// Drives a staged upload through probe, remux, upload and publish.
pub struct UploadPipeline<'a> {
    state: &'a AppState,
    video_id: Uuid,
    content_type: String,
}

impl<'a> UploadPipeline<'a> {
    pub fn new(state: &'a AppState, video_id: Uuid, content_type: String) -> Self {
        Self {
            state,
            video_id,
            content_type,
        }
    }

    pub async fn run(self, staged: StagedFile) -> Result<VideoRecord, IngestError> {
        let video_id = self.video_id;
        let mut step = Pipeline::Staged(staged);

        loop {
            step = match step {
                Pipeline::Staged(staged) => {
                    let info = self.state.prober.probe(staged.path()).await?;
                    Pipeline::Probed { staged, info }
                }
                Pipeline::Probed { staged, info } => {
                    let orientation = classify(info.width, info.height);
                    info!(%video_id, width = info.width, height = info.height, %orientation, "Video classified");
                    Pipeline::Classified { staged, orientation }
                }
                Pipeline::Classified { staged, orientation } => {
                    // Always remux the original upload, never a derivative.
                    let remuxed = self.state.remuxer.remux(staged.path()).await?;
                    Pipeline::Remuxed {
                        staged,
                        remuxed,
                        orientation,
                    }
                }
                Pipeline::Remuxed {
                    staged,
                    remuxed,
                    orientation,
                } => {
                    let key = StorageKey::build(orientation, VIDEO_EXTENSION)?;
                    let uploaded = self
                        .state
                        .storage
                        .put_file(key.as_str(), &self.content_type, remuxed.path())
                        .await;
                    // Local copies are done with whether or not the put worked.
                    drop(remuxed);
                    drop(staged);
                    uploaded?;
                    info!(%video_id, %key, "Video uploaded");
                    Pipeline::Uploaded { key }
                }
                Pipeline::Uploaded { key } => {
                    let url = self.state.storage.public_url(key.as_str());
                    // Only the URL column is written; fields edited while the upload ran stay as they are.
                    // The object stays put if this fails.
                    let record = self
                        .state
                        .videos
                        .set_video_url(video_id, &url, OffsetDateTime::now_utc())
                        .await
                        .map_err(IngestError::Store)?;
                    Pipeline::Published(record)
                }
                Pipeline::Published(record) => return Ok(record),
            };
            tracing::debug!(%video_id, stage = %step.stage(), "Upload advanced");
        }
    }
}

pub struct VideoService;

impl VideoService {
    /// Loads the record and checks the caller owns it. Nothing is written.
    pub async fn authorize(state: &AppState, video_id: Uuid, user_id: Uuid) -> Result<VideoRecord, IngestError> {
        let record = state
            .videos
            .get(video_id)
            .await
            .map_err(IngestError::Lookup)?
            .ok_or(IngestError::NotFound)?;

        if record.user_id != user_id {
            return Err(IngestError::Unauthorized("Unauthorized user".to_string()));
        }
        Ok(record)
    }

    pub async fn upload_video(
        state: &AppState,
        video_id: Uuid,
        user_id: Uuid,
        mut multipart: Multipart,
    ) -> Result<VideoRecord, IngestError> {
        Self::authorize(state, video_id, user_id).await?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| IngestError::Invalid(format!("Unable to parse form: {}", e.body_text())))?
        {
            if field.name() != Some(VIDEO_FIELD) {
                continue;
            }

            let content_type = media_type_in(field.content_type(), ACCEPTED_VIDEO_TYPES)
                .ok_or_else(|| IngestError::Invalid("Invalid file type".to_string()))?;

            info!(%video_id, %user_id, "Starting video upload");
            let staged = stage_field(
                field,
                &state.config.upload_temp_dir,
                UPLOAD_PREFIX,
                &format!(".{}", VIDEO_EXTENSION),
                state.config.max_upload_bytes,
            )
            .await?;
            info!(%video_id, bytes = staged.len(), "Upload staged");

            return UploadPipeline::new(state, video_id, content_type).run(staged).await;
        }

        Err(IngestError::Invalid(format!("No {} field found in multipart request", VIDEO_FIELD)))
    }

    pub async fn create_video(state: &AppState, user_id: Uuid, req: CreateVideoRequest) -> anyhow::Result<VideoRecord> {
        state
            .videos
            .create(NewVideo {
                user_id,
                title: req.title.trim().to_string(),
                description: req.description.unwrap_or_default(),
            })
            .await
    }

    pub async fn list_videos(state: &AppState, user_id: Uuid) -> anyhow::Result<Vec<VideoRecord>> {
        state.videos.list_for_user(user_id).await
    }
}

use axum::extract::Multipart;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::common::random::random_hex;
use crate::common::upload::{HIDDEN_UPLOAD_PREFIX, media_type_in, stage_field};
use crate::modules::video::error::IngestError;
use crate::modules::video::model::VideoRecord;
use crate::modules::video::service::VideoService;
use crate::state::AppState;

pub const THUMBNAIL_FIELD: &str = "thumbnail";
pub const THUMBNAIL_MAX_BYTES: u64 = 10 << 20;
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];

fn extension_for(media_type: &str) -> &'static str {
    if media_type == mime::IMAGE_PNG.essence_str() {
        "png"
    } else {
        "jpg"
    }
}

/// Rejects anything that could step outside the assets directory.
pub fn is_safe_asset_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

pub struct ThumbnailService;

impl ThumbnailService {
    pub async fn upload_thumbnail(
        state: &AppState,
        video_id: Uuid,
        user_id: Uuid,
        mut multipart: Multipart,
    ) -> Result<VideoRecord, IngestError> {
        VideoService::authorize(state, video_id, user_id).await?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| IngestError::Invalid(format!("Unable to parse form: {}", e.body_text())))?
        {
            if field.name() != Some(THUMBNAIL_FIELD) {
                continue;
            }

            let media_type = media_type_in(field.content_type(), ACCEPTED_IMAGE_TYPES)
                .ok_or_else(|| IngestError::Invalid("Incorrect file type".to_string()))?;
            let extension = extension_for(&media_type);

            let assets_root = &state.config.assets_root;
            tokio::fs::create_dir_all(assets_root)
                .await
                .map_err(IngestError::Staging)?;

            // Staged beside the final location so publishing is a rename.
            let staged = stage_field(
                field,
                assets_root,
                HIDDEN_UPLOAD_PREFIX,
                &format!(".{}", extension),
                THUMBNAIL_MAX_BYTES,
            )
            .await?;
            let file_name = format!("{}.{}", random_hex(32)?, extension);
            let dest = assets_root.join(&file_name);
            staged.persist(&dest).map_err(IngestError::Staging)?;

            let url = format!("{}/assets/{}", state.config.public_base_url, file_name);
            let record = match state
                .videos
                .set_thumbnail_url(video_id, &url, OffsetDateTime::now_utc())
                .await
            {
                Ok(record) => record,
                Err(e) => {
                    if let Err(rm) = tokio::fs::remove_file(&dest).await {
                        warn!(%video_id, %file_name, "Couldn't remove unlinked thumbnail: {}", rm);
                    }
                    return Err(IngestError::Store(e));
                }
            };

            info!(%video_id, %file_name, "Thumbnail stored");
            return Ok(record);
        }

        Err(IngestError::Invalid(format!("No {} field found in multipart request", THUMBNAIL_FIELD)))
    }
}

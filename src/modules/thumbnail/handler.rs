use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::{error, warn};
use uuid::Uuid;

use super::service::{is_safe_asset_name, ThumbnailService};
use crate::common::path::VideoId;
use crate::common::response::{ApiError, ApiSuccess, ErrorBody};
use crate::middleware::auth::AuthUser;
use crate::modules::video::model::VideoRecord;
use crate::state::AppState;

/// Upload Thumbnail
/// Stores a JPEG or PNG under the assets directory and links it from the video.
#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/thumbnail",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoRecord),
        (status = 400, description = "Invalid ID, file type or size", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    VideoId(id): VideoId,
    AuthUser(user_id): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    let multipart = match multipart {
        Ok(m) => m,
        Err(e) => return ApiError::bad_request(e.body_text()).into_response(),
    };

    match ThumbnailService::upload_thumbnail(&state, id, user_id, multipart).await {
        Ok(video) => ApiSuccess(video, StatusCode::OK).into_response(),
        Err(e) => {
            if e.is_rejection() {
                warn!(video_id = %id, "Thumbnail rejected: {}", e);
            } else {
                error!(video_id = %id, "Thumbnail upload failed: {}", e);
            }
            ApiError::from(e).into_response()
        }
    }
}

/// Serve Asset
/// Streams a stored thumbnail from the assets directory.
#[utoipa::path(
    get,
    path = "/assets/{name}",
    params(("name" = String, Path, description = "Asset file name")),
    responses(
        (status = 200, description = "Asset bytes"),
        (status = 404, description = "Not Found", body = ErrorBody)
    ),
    tag = "Assets"
)]
pub async fn serve_asset(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    if !is_safe_asset_name(&name) {
        return ApiError::not_found("Asset not found").into_response();
    }

    let path = state.config.assets_root.join(&name);
    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(_) => return ApiError::not_found("Asset not found").into_response(),
    };

    let content_type = mime_guess::from_path(&path).first_or_octet_stream().to_string();
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=3600");

    if let Ok(meta) = file.metadata().await {
        builder = builder.header(header::CONTENT_LENGTH, meta.len());
    }

    let body = Body::from_stream(ReaderStream::new(file));
    builder
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

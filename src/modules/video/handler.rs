use crate::common::path::VideoId;
use crate::common::response::{ApiError, ApiSuccess, ErrorBody};
use crate::middleware::auth::AuthUser;
use crate::modules::video::dto::CreateVideoRequest;
use crate::modules::video::error::IngestError;
use crate::modules::video::model::VideoRecord;
use crate::modules::video::service::VideoService;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

fn report(video_id: Uuid, e: IngestError) -> ApiError {
    if e.is_rejection() {
        warn!(%video_id, stage = %e.stage(), "Request rejected: {}", e);
    } else {
        error!(%video_id, stage = %e.stage(), "Request failed: {}", e);
    }
    e.into()
}

#[utoipa::path(
    post,
    path = "/api/v1/videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video created", body = VideoRecord),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn create_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<CreateVideoRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(body) => body,
        Err(e) => return ApiError::bad_request(e.body_text()).into_response(),
    };
    if let Err(e) = req.validate() {
        return ApiError::bad_request(e.to_string()).into_response();
    }
    if req.title.trim().is_empty() {
        return ApiError::bad_request("Title must not be blank").into_response();
    }

    match VideoService::create_video(&state, user_id, req).await {
        Ok(video) => {
            info!(video_id = %video.id, %user_id, "Video created");
            ApiSuccess(video, StatusCode::CREATED).into_response()
        }
        Err(e) => {
            error!(%user_id, "Couldn't create video: {:#}", e);
            ApiError::internal("Couldn't create video").into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/videos",
    responses(
        (status = 200, description = "Videos owned by the caller", body = Vec<VideoRecord>),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn list_videos(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> impl IntoResponse {
    match VideoService::list_videos(&state, user_id).await {
        Ok(videos) => ApiSuccess(videos, StatusCode::OK).into_response(),
        Err(e) => {
            error!(%user_id, "Couldn't retrieve videos: {:#}", e);
            ApiError::internal("Couldn't retrieve videos").into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video", body = VideoRecord),
        (status = 400, description = "Invalid video ID", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody)
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn get_video(
    State(state): State<AppState>,
    VideoId(id): VideoId,
    AuthUser(user_id): AuthUser,
) -> impl IntoResponse {
    match VideoService::authorize(&state, id, user_id).await {
        Ok(video) => ApiSuccess(video, StatusCode::OK).into_response(),
        Err(e) => report(id, e).into_response(),
    }
}

/// Upload Video
/// Stages the `video` form field, remuxes it for fast start, stores it in the
/// bucket and records the public URL on the video.
#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/upload",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload successful", body = VideoRecord),
        (status = 400, description = "Invalid ID, file type or size", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
        (status = 500, description = "Processing or storage failure", body = ErrorBody)
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<AppState>,
    VideoId(id): VideoId,
    AuthUser(user_id): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    let multipart = match multipart {
        Ok(m) => m,
        Err(e) => return ApiError::bad_request(e.body_text()).into_response(),
    };

    match VideoService::upload_video(&state, id, user_id, multipart).await {
        Ok(video) => {
            info!(video_id = %id, url = video.video_url.as_deref().unwrap_or_default(), "Video published");
            ApiSuccess(video, StatusCode::OK).into_response()
        }
        Err(e) => report(id, e).into_response(),
    }
}

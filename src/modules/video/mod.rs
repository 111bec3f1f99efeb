use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use crate::state::AppState;

pub mod aspect;
pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;
pub mod storage_key;


/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_SLACK: u64 = 64 * 1024;

pub fn router(state: &AppState) -> Router<AppState> {
    let body_limit = usize::try_from(state.config.max_upload_bytes.saturating_add(MULTIPART_SLACK))
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/videos", get(handler::list_videos).post(handler::create_video))
        .route("/videos/{id}", get(handler::get_video))
        .route(
            "/videos/{id}/upload",
            post(handler::upload_video).layer(DefaultBodyLimit::max(body_limit)),
        )
}

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use crate::state::AppState;

pub mod handler;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/videos/{id}/thumbnail",
        post(handler::upload_thumbnail)
            .layer(DefaultBodyLimit::max(service::THUMBNAIL_MAX_BYTES as usize + 64 * 1024)),
    )
}

pub fn assets_router() -> Router<AppState> {
    Router::new().route("/assets/{name}", get(handler::serve_asset))
}

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::common::response::ApiError;

/// `{id}` path segment parsed as a video UUID. Anything else is a 400 with
/// the usual JSON error body rather than axum's plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct VideoId(pub Uuid);

impl<S> FromRequestParts<S> for VideoId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("Invalid video ID"))?;

        Uuid::parse_str(&raw)
            .map(VideoId)
            .map_err(|_| ApiError::bad_request("Invalid video ID"))
    }
}

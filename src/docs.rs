use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::common::response::ErrorBody;
use crate::modules::video::dto::CreateVideoRequest;
use crate::modules::video::model::VideoRecord;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tubecast",
        description = "Video records, fast-start uploads to object storage and thumbnails"
    ),
    paths(
        crate::modules::video::handler::create_video,
        crate::modules::video::handler::list_videos,
        crate::modules::video::handler::get_video,
        crate::modules::video::handler::upload_video,
        crate::modules::thumbnail::handler::upload_thumbnail,
        crate::modules::thumbnail::handler::serve_asset,
    ),
    components(schemas(VideoRecord, CreateVideoRequest, ErrorBody)),
    tags(
        (name = "Videos", description = "Video records and uploads"),
        (name = "Assets", description = "Locally stored thumbnails")
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the handlers reference.
pub struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

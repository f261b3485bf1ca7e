//! OpenAPI configuration.

use crate::api::{greeting::greeting_api, info::info_api};
use utoipa::OpenApi;

/// OpenApi configuration.
#[derive(OpenApi)]
#[openapi(
    paths(
        info_api::info,
        greeting_api::greet,
        greeting_api::greet_json,
    ),
    components(
        schemas(
            info_api::AppInfo,
            greeting_api::NameRequest,
            greeting_api::GreetingResponse,
            crate::infra::error::ErrorBody
        )
    )
)]
#[derive(Clone, Copy, Debug)]
pub struct ApiDoc;

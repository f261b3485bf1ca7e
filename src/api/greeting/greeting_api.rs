//! Implementation of the greeting API. An API that returns a personalized
//! greeting, either via a query parameter or a JSON payload.

use crate::{
    api::greeting::greeting_service,
    infra::{
        error::ClientError,
        extract::{Json, Query},
        state::AppState,
    },
};
use axum::Router;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

/// The greeting API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new().typed_get(greet).typed_post(greet_json)
}

#[derive(Deserialize, TypedPath)]
#[typed_path("/greet", rejection(ClientError))]
pub struct Greet;

/// The query parameters of the greeting endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct GreetParams {
    /// The name of the person to greet.
    name: Option<String>,
}

/// A request to greet someone by name.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NameRequest {
    /// The name of the person to greet.
    name: String,
}

/// A personalized greeting.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GreetingResponse {
    /// The greeting message.
    message: String,
}

impl GreetingResponse {
    /// Constructs a new greeting response.
    pub fn new(message: String) -> Self {
        Self { message }
    }

    /// Returns the greeting message.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }
}

/// Greet via query parameter.
///
/// Returns a greeting based on the query parameter `name`,
/// or a default greeting if no name is given.
#[utoipa::path(
    get,
    path = "/greet",
    params(GreetParams),
    responses(
        (status = 200, description = "Success", body = GreetingResponse),
    )
)]
#[instrument(skip_all)]
pub async fn greet(Greet: Greet, Query(params): Query<GreetParams>) -> Json<GreetingResponse> {
    let name = params.name.as_deref().unwrap_or("World");
    Json(GreetingResponse::new(greeting_service::greet(name)))
}

/// Greet via JSON payload.
///
/// Returns a greeting based on the JSON body with a `name` field.
#[utoipa::path(
    post,
    path = "/greet",
    request_body = NameRequest,
    responses(
        (status = 200, description = "Success", body = GreetingResponse),
        (status = 422, description = "Unprocessable Entity", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
pub async fn greet_json(Greet: Greet, Json(request): Json<NameRequest>) -> Json<GreetingResponse> {
    Json(GreetingResponse::new(greeting_service::greet(&request.name)))
}

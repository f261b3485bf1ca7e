//! REST API implementation.
//!
//! # Examples
//!
//! Greeting API.
//!
//! ```rust
//! # use greeting_api::api::greeting::greeting_api::GreetingResponse;
//! # tokio_test::block_on(async {
//! # let url = greeting_api::app::spawn_app().await;
//! let response = reqwest::get(format!("{}/greet", url)).await.unwrap();
//! assert_eq!(200, response.status());
//! assert_eq!(GreetingResponse::new("Hello World".to_string()), response.json::<GreetingResponse>().await.unwrap());
//! # });
//! ```
//!
//! Greeting API with name.
//!
//! ```rust
//! # use greeting_api::api::greeting::greeting_api::GreetingResponse;
//! # tokio_test::block_on(async {
//! # let url = greeting_api::app::spawn_app().await;
//! let response = reqwest::get(format!("{}/greet?name=Foo", url)).await.unwrap();
//! assert_eq!(200, response.status());
//! assert_eq!(GreetingResponse::new("Hello Foo".to_string()), response.json::<GreetingResponse>().await.unwrap());
//! # });
//! ```

use std::iter;
use std::time::Duration;

use crate::infra::error::{ApiResult, ClientError, InternalError, PanicHandler};
use crate::infra::middleware::{cors_layer, MakeRequestIdSpan};
use crate::infra::openapi::ApiDoc;
use crate::infra::{config::Config, state::AppState};
use axum::error_handling::HandleErrorLayer;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use http::header::AUTHORIZATION;
use http::Uri;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{instrument, Level};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

/// Constructs the full axum application.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors);

    // Fallible middleware from tower, mapped to infallible response with [`HandleErrorLayer`].
    let tower_middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|e| async move {
            InternalError::Other(format!("Tower middleware failed: {e}")).into_response()
        }))
        .concurrency_limit(500);

    // The full application with API documentation.
    Router::new()
        .route("/", get(index))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/redoc", ApiDoc::openapi()))
        .merge(RapiDoc::new("/openapi.json").path("/rapidoc"))
        .merge(crate::api::api(state))
        .fallback(not_found)
        // Layers
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestIdSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(SetSensitiveRequestHeadersLayer::new(iter::once(
            AUTHORIZATION,
        )))
        .layer(tower_middleware)
        .layer(CatchPanicLayer::custom(PanicHandler))
}

/// Starts the axum server.
pub async fn run_app(addr: TcpListener, config: Config) -> Result<(), hyper::Error> {
    let state = AppState::new(config);
    let app = app(state).into_make_service();

    tracing::info!("Starting axum on {}", addr.local_addr().unwrap());
    let exit_result = axum::serve(addr, app)
        .with_graceful_shutdown(crate::infra::shutdown::shutdown_signal())
        .await;

    match exit_result {
        Ok(_) => tracing::info!("Successfully shut down"),
        Err(e) => tracing::error!("Shutdown failed: {}", e),
    }

    Ok(())
}

/// Spawn a server on a random port.
pub async fn spawn_app() -> String {
    let config = crate::infra::config::load_config().unwrap();
    spawn_app_with_config(config).await
}

/// Spawn a server on a random port with a custom configuration.
pub async fn spawn_app_with_config(config: Config) -> String {
    let address = "127.0.0.1";
    let listener = TcpListener::bind(format!("{address}:0")).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(run_app(listener, config));
    format!("http://{address}:{port}")
}

/// A landing page that links to the API documentation.
async fn index() -> Html<&'static str> {
    Html(
        r#"
        <h1>Greeting API</h1>
        <ul>
            <li><a href="/docs">Swagger UI</a></li>
            <li><a href="/redoc">Redoc</a></li>
            <li><a href="/rapidoc">RapiDoc</a></li>
        </ul>
        "#,
    )
}

/// Replies to unknown paths with a JSON error body.
#[instrument]
async fn not_found(uri: Uri) -> ApiResult<()> {
    Err(ClientError::NotFound.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::greeting::greeting_api::GreetingResponse,
        infra::{config::load_config, error::ErrorBody},
    };
    use axum::{body::Body, response::Response, Router};
    use futures::StreamExt;
    use http::{header, Method, Request, StatusCode};
    use serde::Deserialize;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = load_config().unwrap();
        app(AppState::new(config))
    }

    async fn get<T: for<'a> Deserialize<'a>>(url: &str) -> T {
        let client = reqwest::ClientBuilder::default().build().unwrap();
        client.get(url).send().await.unwrap().json().await.unwrap()
    }

    async fn json_body<T: for<'a> Deserialize<'a>>(res: Response) -> T {
        let body: Vec<u8> = res
            .into_body()
            .into_data_stream()
            .filter_map(|res| std::future::ready(res.ok().map(|b| b.to_vec())))
            .concat()
            .await;
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn greet_gives_correct_response() {
        let url = spawn_app().await;
        let response: GreetingResponse = get(&format!("{url}/greet?name=Alice")).await;
        assert_eq!("Hello Alice", response.message());
    }

    #[tokio::test]
    async fn greet_defaults_to_world() {
        let url = spawn_app().await;
        let response: GreetingResponse = get(&format!("{url}/greet")).await;
        assert_eq!("Hello World", response.message());
    }

    #[tokio::test]
    async fn greet_json_gives_correct_response() {
        let url = spawn_app().await;
        let client = reqwest::ClientBuilder::default().build().unwrap();
        let response = client
            .post(format!("{url}/greet"))
            .json(&json!({ "name": "Bob" }))
            .send()
            .await
            .unwrap();
        assert_eq!(200, response.status());
        let greeting: GreetingResponse = response.json().await.unwrap();
        assert_eq!("Hello Bob", greeting.message());
    }

    #[tokio::test]
    async fn info_gives_correct_response() {
        let url = spawn_app().await;
        let info: Value = get(&format!("{url}/info")).await;
        assert_eq!("greeting-api", info["name"]);
        assert_eq!("1.0.0", info["version"]);
    }

    #[tokio::test]
    async fn greet_oneshot_with_empty_name() {
        let req = Request::get("/greet?name=").body(Body::empty()).unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status());
        let greeting: GreetingResponse = json_body(res).await;
        assert_eq!("Hello ", greeting.message());
    }

    #[tokio::test]
    async fn greet_json_missing_name_gives_422() {
        let req = Request::post("/greet")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{}"#))
            .unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, res.status());
        let body: ErrorBody = json_body(res).await;
        assert!(body.message().contains("missing field"));
    }

    #[tokio::test]
    async fn greet_json_wrong_type_gives_422() {
        let req = Request::post("/greet")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name": 123}"#))
            .unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, res.status());
        let body: ErrorBody = json_body(res).await;
        assert!(body.message().contains("invalid type"));
    }

    #[tokio::test]
    async fn greet_json_malformed_body_gives_400() {
        let req = Request::post("/greet")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"#))
            .unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
    }

    #[tokio::test]
    async fn greet_json_wrong_content_type_gives_415() {
        let req = Request::post("/greet")
            .body(Body::from(r#"{"name": "Bob"}"#))
            .unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::UNSUPPORTED_MEDIA_TYPE, res.status());
    }

    #[tokio::test]
    async fn preflight_from_allowed_origin_is_accepted() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/greet")
            .header(header::ORIGIN, "https://chrwittm.github.io")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status());
        assert_eq!(
            "https://chrwittm.github.io",
            res.headers()["access-control-allow-origin"]
        );
        assert_eq!("true", res.headers()["access-control-allow-credentials"]);
        assert_eq!("POST", res.headers()["access-control-allow-methods"]);
        assert_eq!("content-type", res.headers()["access-control-allow-headers"]);
    }

    #[tokio::test]
    async fn allowed_origin_gets_cors_headers() {
        let req = Request::get("/greet?name=Alice")
            .header(header::ORIGIN, "http://localhost:8000")
            .body(Body::empty())
            .unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status());
        assert_eq!(
            "http://localhost:8000",
            res.headers()["access-control-allow-origin"]
        );
        assert_eq!("true", res.headers()["access-control-allow-credentials"]);
    }

    #[tokio::test]
    async fn unknown_origin_gets_no_cors_headers() {
        let req = Request::get("/greet?name=Alice")
            .header(header::ORIGIN, "https://example.com")
            .body(Body::empty())
            .unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status());
        assert!(res.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn unknown_path_gives_404() {
        let req = Request::get("/missing").body(Body::empty()).unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::NOT_FOUND, res.status());
        let body: ErrorBody = json_body(res).await;
        assert_eq!("not found", body.message());
    }

    #[tokio::test]
    async fn index_oneshot() {
        let req = Request::get("/").body(Body::empty()).unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status())
    }

    #[tokio::test]
    async fn swagger_ui_oneshot() {
        let req = Request::get("/docs/index.html").body(Body::empty()).unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status())
    }

    #[tokio::test]
    async fn redoc_oneshot() {
        let req = Request::get("/redoc").body(Body::empty()).unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status())
    }

    #[tokio::test]
    async fn rapidoc_oneshot() {
        let req = Request::get("/rapidoc").body(Body::empty()).unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status())
    }

    #[tokio::test]
    async fn openapi_lists_documented_paths() {
        let req = Request::get("/openapi.json").body(Body::empty()).unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status());
        let doc: Value = json_body(res).await;
        assert!(doc["paths"]["/greet"]["get"].is_object());
        assert!(doc["paths"]["/greet"]["post"].is_object());
        assert!(doc["paths"]["/info"]["get"].is_object());
    }
}

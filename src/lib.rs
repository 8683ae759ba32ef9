pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::ConverterConfig;
use crate::services::converter::ConverterService;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::convert::convert_files,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "convert", description = "Pipe-delimited records to xlsx conversion"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<ConverterService>,
    pub config: ConverterConfig,
}

impl AppState {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            converter: Arc::new(ConverterService::new(config.clone())),
            config,
        }
    }
}

fn cors_layer(config: &ConverterConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(origins)
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_size;
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/convert", post(api::handlers::convert::convert_files))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(api::handlers::docs::openapi_json),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}

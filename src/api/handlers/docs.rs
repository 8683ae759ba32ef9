use crate::ApiDoc;
use axum::{Json, response::IntoResponse};
use utoipa::OpenApi;

/// OpenAPI document describing the conversion API.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

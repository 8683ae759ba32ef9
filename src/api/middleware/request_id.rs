use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id available to handlers through `Extension<RequestId>`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let (request_id, header_value) = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .and_then(|v| Some((v.to_string(), HeaderValue::from_str(v).ok()?)))
        .unwrap_or_else(|| {
            let id = Uuid::new_v4().to_string();
            let value = HeaderValue::from_str(&id).unwrap_or(HeaderValue::from_static("unknown"));
            (id, value)
        });

    req.headers_mut()
        .insert(REQUEST_ID_HEADER, header_value.clone());
    req.extensions_mut().insert(RequestId(request_id));

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value);

    response
}

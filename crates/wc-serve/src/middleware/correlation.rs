use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use ulid::Ulid;

#[derive(Clone, Debug)]
pub struct CorrelationId(pub String);

pub const HEADER_NAME: &str = "x-correlation-id";

/// Reuses the caller's correlation id or mints `corr_<ulid>`, and echoes it
/// back on the response.
pub async fn correlation_middleware(mut request: Request<Body>, next: Next) -> Response {
    let header = HeaderName::from_static(HEADER_NAME);
    let id = request
        .headers()
        .get(&header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| format!("corr_{}", Ulid::new()), str::to_string);

    request.extensions_mut().insert(CorrelationId(id.clone()));
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(header, value);
    }
    response
}

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;
use wc_core::WakeError;
use wc_core::error::{AlarmError, CatalogError};

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    #[schema(value_type = String)]
    pub code: &'static str,
    pub message: String,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &WakeError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code, message) = match err {
        WakeError::Alarm(alarm) => map_alarm_error(alarm),
        WakeError::Catalog(catalog) => map_catalog_error(catalog),
        WakeError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
        WakeError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    };

    (
        status,
        Json(ErrorEnvelope {
            code,
            message,
            correlation_id,
        }),
    )
}

pub fn error_response(err: impl Into<WakeError>, correlation_id: Option<String>) -> Response {
    map_error(&err.into(), correlation_id).into_response()
}

fn map_alarm_error(err: &AlarmError) -> (StatusCode, &'static str, String) {
    match err {
        AlarmError::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        AlarmError::InvalidTime(_) | AlarmError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
    }
}

fn map_catalog_error(err: &CatalogError) -> (StatusCode, &'static str, String) {
    match err {
        CatalogError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        CatalogError::Empty | CatalogError::Io { .. } | CatalogError::InvalidDefinition { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wc_core::types::TimeOfDay;

    #[test]
    fn invalid_time_is_bad_request() {
        let err = "7:30".parse::<TimeOfDay>().unwrap_err();
        let (status, Json(body)) = map_error(&AlarmError::from(err).into(), Some("corr_1".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "invalid_input");
        assert_eq!(body.correlation_id.as_deref(), Some("corr_1"));
    }

    #[test]
    fn missing_challenge_is_not_found() {
        let err = WakeError::from(CatalogError::NotFound {
            name: "bfs".to_string(),
        });
        let (status, Json(body)) = map_error(&err, None);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.message.contains("bfs"));
    }

    #[test]
    fn invalid_input_is_bad_request() {
        let err = WakeError::InvalidInput {
            message: "missing code".to_string(),
        };
        let (status, Json(body)) = map_error(&err, None);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "invalid_input");
    }

    #[test]
    fn catalog_load_failures_are_internal() {
        let err = WakeError::from(CatalogError::InvalidDefinition {
            name: "bfs".to_string(),
            message: "no test cases".to_string(),
        });
        let (status, Json(body)) = map_error(&err, None);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "internal_error");
    }
}

use crate::AppState;
use crate::middleware::correlation::CorrelationId;
use crate::routes::error::error_response;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use wc_core::WakeError;
use wc_core::types::HarnessResult;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifySolutionInput {
    challenge_id: Option<String>,
    solution: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/verify-solution", post(verify_solution))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/verify-solution",
    request_body = VerifySolutionInput,
    responses(
        (status = 200, body = HarnessResult),
        (status = 400, body = crate::routes::error::ErrorEnvelope)
    )
)]
pub(crate) async fn verify_solution(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Json(input): Json<VerifySolutionInput>,
) -> Response {
    let present = |value: Option<String>| value.filter(|value| !value.is_empty());
    let (Some(challenge_id), Some(solution)) = (present(input.challenge_id), present(input.solution))
    else {
        return error_response(
            WakeError::InvalidInput {
                message: "Missing required fields".to_string(),
            },
            Some(correlation.0),
        );
    };

    // Someone typing a solution is at the keyboard.
    state.presence.record_activity();

    let harness = state.harness.clone();
    let name = challenge_id.clone();
    let result =
        match tokio::task::spawn_blocking(move || harness.run(&name, &solution)).await {
            Ok(result) => result,
            Err(err) => {
                return error_response(
                    WakeError::Internal {
                        message: format!("harness task failed: {err}"),
                    },
                    Some(correlation.0),
                );
            }
        };

    if let Some(alarm_id) = state.scheduler.resolve(&challenge_id, &result) {
        tracing::info!(
            alarm_id = %alarm_id,
            challenge = %challenge_id,
            correlation_id = %correlation.0,
            "solution accepted"
        );
    }
    Json(result).into_response()
}

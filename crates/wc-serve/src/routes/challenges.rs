use crate::AppState;
use crate::routes::error::error_response;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;
use wc_core::error::CatalogError;
use wc_core::types::Challenge;

#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeList {
    challenges: Vec<String>,
    count: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/challenges", get(list_challenges))
        .route("/challenges/{name}", get(get_challenge))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/challenges",
    responses((status = 200, body = ChallengeList))
)]
pub(crate) async fn list_challenges(State(state): State<AppState>) -> Json<ChallengeList> {
    Json(ChallengeList {
        challenges: state.catalog.names(),
        count: state.catalog.len(),
    })
}

#[utoipa::path(
    get,
    path = "/api/challenges/{name}",
    params(("name" = String, Path, description = "Challenge name")),
    responses(
        (status = 200, body = Challenge),
        (status = 404, body = crate::routes::error::ErrorEnvelope)
    )
)]
pub(crate) async fn get_challenge(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.catalog.by_name(&name) {
        Some(challenge) => Json(challenge.as_ref()).into_response(),
        None => error_response(CatalogError::NotFound { name }, None),
    }
}

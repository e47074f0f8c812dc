use crate::AppState;
use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events/subscribe", get(subscribe))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/events/subscribe",
    responses((status = 200, description = "Server-sent stream of EventRecord values"))
)]
pub(crate) async fn subscribe(State(state): State<AppState>) -> Response {
    crate::sse::subscribe(&state)
}

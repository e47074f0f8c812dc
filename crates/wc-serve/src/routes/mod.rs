pub mod alarms;
pub mod challenges;
pub mod error;
pub mod events;
pub mod sessions;
pub mod solutions;

use crate::middleware::correlation::correlation_middleware;
use crate::{AppState, openapi};
use axum::Router;
use axum::middleware;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(alarms::router(state.clone()))
        .merge(sessions::router(state.clone()))
        .merge(challenges::router(state.clone()))
        .merge(solutions::router(state.clone()))
        .merge(events::router(state))
        .merge(openapi::router())
        .route_layer(middleware::from_fn(correlation_middleware));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}

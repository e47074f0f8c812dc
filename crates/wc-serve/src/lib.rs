pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod sse;

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use wc_core::types::EventBody;
use wc_core::{AlarmRegistry, ChallengeCatalog, PresenceMonitor, Scheduler};
use wc_events::bus::EventBus;
use wc_events::types::{EventRecord, EventSource};
use wc_harness::Harness;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AlarmRegistry>,
    pub catalog: Arc<ChallengeCatalog>,
    pub scheduler: Arc<Scheduler>,
    pub presence: Arc<PresenceMonitor>,
    pub harness: Harness,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn publish(&self, correlation_id: Option<String>, body: &EventBody) {
        match serde_json::to_value(body) {
            Ok(value) => {
                self.event_bus
                    .publish(EventRecord::new(EventSource::Ui, correlation_id, value));
            }
            Err(err) => tracing::warn!(error = %err, "failed to encode event"),
        }
    }
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "api listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}

use crate::AppState;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Live events only; nothing is persisted, so there is no history to replay.
/// Subscribers that fall behind skip the events they missed.
pub fn subscribe(state: &AppState) -> Response {
    let live_stream = BroadcastStream::new(state.event_bus.subscribe()).filter_map(|item| async move {
        match item {
            Ok(event) => {
                let json = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
                Some(Ok::<Event, std::convert::Infallible>(
                    Event::default().id(event.id).data(json),
                ))
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "sse subscriber lagged");
                None
            }
        }
    });

    Sse::new(live_stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

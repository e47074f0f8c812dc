use crate::AppState;
use crate::routes::MessageResponse;
use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;
use wc_core::types::{ActiveSession, AlarmId, TimeOfDay};

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckAlarmsResponse {
    alarm_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    challenge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alarm_id: Option<AlarmId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<TimeOfDay>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearedResponse {
    cleared: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertStatus {
    active: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/check-alarms", get(check_alarms))
        .route("/sessions", get(list_sessions))
        .route("/sessions/{alarm_id}", delete(clear_session))
        .route("/dismiss-sound", post(dismiss_sound))
        .route("/activity", post(record_activity))
        .route("/alert", get(alert_status))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/check-alarms",
    responses((status = 200, body = CheckAlarmsResponse))
)]
pub(crate) async fn check_alarms(State(state): State<AppState>) -> Json<CheckAlarmsResponse> {
    let response = match state.scheduler.active_session() {
        Some(session) => CheckAlarmsResponse {
            alarm_triggered: true,
            challenge_id: Some(session.challenge_name),
            alarm_id: Some(session.alarm_id),
            time: Some(session.time),
        },
        None => CheckAlarmsResponse {
            alarm_triggered: false,
            challenge_id: None,
            alarm_id: None,
            time: None,
        },
    };
    Json(response)
}

#[utoipa::path(
    get,
    path = "/api/sessions",
    responses((status = 200, body = Vec<ActiveSession>))
)]
pub(crate) async fn list_sessions(State(state): State<AppState>) -> Json<Vec<ActiveSession>> {
    Json(state.scheduler.sessions())
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{alarm_id}",
    params(("alarm_id" = String, Path, description = "Alarm ID")),
    responses((status = 200, body = ClearedResponse))
)]
pub(crate) async fn clear_session(
    State(state): State<AppState>,
    Path(alarm_id): Path<String>,
) -> Json<ClearedResponse> {
    let cleared = AlarmId::new(alarm_id).is_ok_and(|id| state.scheduler.clear(&id));
    Json(ClearedResponse { cleared })
}

#[utoipa::path(
    post,
    path = "/api/dismiss-sound",
    responses((status = 200, body = MessageResponse))
)]
pub(crate) async fn dismiss_sound(State(state): State<AppState>) -> Json<MessageResponse> {
    state.scheduler.dismiss_alert();
    Json(MessageResponse::new("Sound dismissed"))
}

#[utoipa::path(
    post,
    path = "/api/activity",
    responses((status = 200, body = MessageResponse))
)]
pub(crate) async fn record_activity(State(state): State<AppState>) -> Json<MessageResponse> {
    state.presence.record_activity();
    Json(MessageResponse::new("Activity recorded"))
}

#[utoipa::path(
    get,
    path = "/api/alert",
    responses((status = 200, body = AlertStatus))
)]
pub(crate) async fn alert_status(State(state): State<AppState>) -> Json<AlertStatus> {
    Json(AlertStatus {
        active: state.scheduler.alert_active(),
    })
}

use crate::AppState;
use crate::middleware::correlation::CorrelationId;
use crate::routes::MessageResponse;
use crate::routes::error::error_response;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use wc_core::error::AlarmError;
use wc_core::types::{Alarm, AlarmId, EventBody};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAlarmInput {
    time: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlarmCreated {
    message: String,
    alarm_id: AlarmId,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveInput {
    active: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/alarms", get(list_alarms).post(add_alarm))
        .route("/alarms/{id}", patch(set_active).delete(delete_alarm))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/alarms",
    responses((status = 200, body = BTreeMap<String, Alarm>))
)]
pub(crate) async fn list_alarms(State(state): State<AppState>) -> Json<BTreeMap<AlarmId, Alarm>> {
    Json(state.registry.list())
}

#[utoipa::path(
    post,
    path = "/api/alarms",
    request_body = CreateAlarmInput,
    responses(
        (status = 200, body = AlarmCreated),
        (status = 400, body = crate::routes::error::ErrorEnvelope)
    )
)]
pub(crate) async fn add_alarm(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Json(input): Json<CreateAlarmInput>,
) -> Response {
    let Some(time) = input.time.filter(|time| !time.is_empty()) else {
        return error_response(
            AlarmError::InvalidInput {
                message: "time is required".to_string(),
            },
            Some(correlation.0),
        );
    };
    match state.registry.add(&time) {
        Ok(alarm) => {
            let created = AlarmCreated {
                message: "Alarm added successfully".to_string(),
                alarm_id: alarm.id.clone(),
            };
            state.publish(Some(correlation.0), &EventBody::AlarmAdded { alarm });
            Json(created).into_response()
        }
        Err(err) => error_response(err, Some(correlation.0)),
    }
}

#[utoipa::path(
    delete,
    path = "/api/alarms/{id}",
    params(("id" = String, Path, description = "Alarm ID")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, body = crate::routes::error::ErrorEnvelope)
    )
)]
pub(crate) async fn delete_alarm(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
) -> Response {
    // An id that does not parse cannot name a stored alarm.
    let Ok(alarm_id) = AlarmId::new(id) else {
        return error_response(AlarmError::NotFound, Some(correlation.0));
    };
    if !state.registry.delete(&alarm_id) {
        return error_response(AlarmError::NotFound, Some(correlation.0));
    }
    state.publish(Some(correlation.0), &EventBody::AlarmDeleted { alarm_id });
    Json(MessageResponse::new("Alarm deleted successfully")).into_response()
}

#[utoipa::path(
    patch,
    path = "/api/alarms/{id}",
    params(("id" = String, Path, description = "Alarm ID")),
    request_body = SetActiveInput,
    responses(
        (status = 200, body = Alarm),
        (status = 404, body = crate::routes::error::ErrorEnvelope)
    )
)]
pub(crate) async fn set_active(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    Json(input): Json<SetActiveInput>,
) -> Response {
    let Ok(alarm_id) = AlarmId::new(id) else {
        return error_response(AlarmError::NotFound, Some(correlation.0));
    };
    match state.registry.set_active(&alarm_id, input.active) {
        Some(alarm) => {
            state.publish(
                Some(correlation.0),
                &EventBody::AlarmToggled {
                    alarm: alarm.clone(),
                },
            );
            Json(alarm).into_response()
        }
        None => error_response(AlarmError::NotFound, Some(correlation.0)),
    }
}

use crate::routes::alarms::{AlarmCreated, CreateAlarmInput, SetActiveInput};
use crate::routes::challenges::ChallengeList;
use crate::routes::error::ErrorEnvelope;
use crate::routes::sessions::{AlertStatus, CheckAlarmsResponse, ClearedResponse};
use crate::routes::solutions::VerifySolutionInput;
use crate::routes::MessageResponse;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;
use wc_core::types::{
    ActiveSession, Alarm, AlarmId, Challenge, ClearReason, EventBody, HarnessResult, TestCase,
    TestResult, TimeOfDay,
};
use wc_events::types::{EventRecord, EventSource};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::alarms::list_alarms,
        crate::routes::alarms::add_alarm,
        crate::routes::alarms::delete_alarm,
        crate::routes::alarms::set_active,
        crate::routes::sessions::check_alarms,
        crate::routes::sessions::list_sessions,
        crate::routes::sessions::clear_session,
        crate::routes::sessions::dismiss_sound,
        crate::routes::sessions::record_activity,
        crate::routes::sessions::alert_status,
        crate::routes::challenges::list_challenges,
        crate::routes::challenges::get_challenge,
        crate::routes::solutions::verify_solution,
        crate::routes::events::subscribe
    ),
    components(schemas(
        Alarm,
        AlarmId,
        TimeOfDay,
        ActiveSession,
        Challenge,
        TestCase,
        TestResult,
        HarnessResult,
        EventRecord,
        EventSource,
        EventBody,
        ClearReason,
        CreateAlarmInput,
        AlarmCreated,
        SetActiveInput,
        CheckAlarmsResponse,
        ClearedResponse,
        AlertStatus,
        ChallengeList,
        VerifySolutionInput,
        MessageResponse,
        ErrorEnvelope
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn router() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

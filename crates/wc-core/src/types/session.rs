use crate::types::ids::AlarmId;
use crate::types::time::TimeOfDay;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Live binding of a fired alarm to the challenge that silences it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActiveSession {
    pub alarm_id: AlarmId,
    pub time: TimeOfDay,
    pub challenge_name: String,
    pub triggered_at: NaiveDateTime,
}

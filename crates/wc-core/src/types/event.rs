use crate::types::alarm::Alarm;
use crate::types::ids::AlarmId;
use crate::types::session::ActiveSession;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "payload")]
pub enum EventBody {
    AlarmAdded {
        alarm: Alarm,
    },
    AlarmDeleted {
        alarm_id: AlarmId,
    },
    AlarmToggled {
        alarm: Alarm,
    },
    AlarmTriggered {
        session: ActiveSession,
    },
    SessionCleared {
        alarm_id: AlarmId,
        reason: ClearReason,
    },
    AlertStarted,
    AlertStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub enum ClearReason {
    Solved,
    Cleared,
    Shutdown,
}

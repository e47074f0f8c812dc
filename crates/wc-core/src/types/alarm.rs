use crate::types::ids::AlarmId;
use crate::types::time::TimeOfDay;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: TimeOfDay,
    pub active: bool,
    pub last_triggered: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Alarm {
    pub fn new(time: TimeOfDay) -> Self {
        Self {
            id: AlarmId::generate(),
            time,
            active: true,
            last_triggered: None,
            created_at: Utc::now(),
        }
    }

    /// True when the alarm should fire at `time` on `date`.
    pub fn is_due(&self, time: TimeOfDay, date: NaiveDate) -> bool {
        self.active && self.time == time && self.last_triggered != Some(date)
    }
}

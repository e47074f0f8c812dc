use crate::error::AlarmError;
use crate::types::{Alarm, AlarmId, TimeOfDay};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory alarm table. Every operation takes the registry's own lock, so
/// concurrent callers never observe a half-applied update.
#[derive(Debug, Default)]
pub struct AlarmRegistry {
    alarms: Mutex<BTreeMap<AlarmId, Alarm>>,
}

impl AlarmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, BTreeMap<AlarmId, Alarm>> {
        self.alarms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates `time` as strict `HH:MM` before touching the table.
    pub fn add(&self, time: &str) -> Result<Alarm, AlarmError> {
        let time: TimeOfDay = time.parse()?;
        let alarm = Alarm::new(time);
        self.table().insert(alarm.id.clone(), alarm.clone());
        tracing::info!(alarm_id = %alarm.id, %time, "alarm added");
        Ok(alarm)
    }

    pub fn delete(&self, id: &AlarmId) -> bool {
        let removed = self.table().remove(id).is_some();
        if removed {
            tracing::info!(alarm_id = %id, "alarm deleted");
        }
        removed
    }

    pub fn get(&self, id: &AlarmId) -> Option<Alarm> {
        self.table().get(id).cloned()
    }

    pub fn list(&self) -> BTreeMap<AlarmId, Alarm> {
        self.table().clone()
    }

    pub fn list_active(&self) -> BTreeMap<AlarmId, Alarm> {
        self.table()
            .iter()
            .filter(|(_, alarm)| alarm.active)
            .map(|(id, alarm)| (id.clone(), alarm.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    pub fn mark_triggered(&self, id: &AlarmId, date: NaiveDate) -> bool {
        match self.table().get_mut(id) {
            Some(alarm) => {
                alarm.last_triggered = Some(date);
                true
            }
            None => false,
        }
    }

    pub fn set_active(&self, id: &AlarmId, active: bool) -> Option<Alarm> {
        let mut table = self.table();
        let alarm = table.get_mut(id)?;
        alarm.active = active;
        Some(alarm.clone())
    }
}

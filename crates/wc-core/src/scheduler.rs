//! Background alarm scheduler and the active-session table it owns.
//!
//! Per alarm the lifecycle is `Idle -> Due -> SessionActive -> Idle`. A tick
//! moves due alarms into sessions; `clear` and `resolve` move them back.
//! Request handlers only reach the session table through the methods here,
//! each of which takes the scheduler lock.

use crate::actuator::AlertActuator;
use crate::alarms::AlarmRegistry;
use crate::catalog::ChallengeCatalog;
use crate::clock::Clock;
use crate::error::SchedulerError;
use crate::presence::PresenceMonitor;
use crate::types::{ActiveSession, AlarmId, ClearReason, EventBody, HarnessResult, TimeOfDay};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use wc_events::bus::EventBus;
use wc_events::types::{EventRecord, EventSource};

/// A failed tick waits this many tick intervals before the next attempt.
pub const ERROR_BACKOFF_FACTOR: u32 = 5;

pub struct Scheduler {
    registry: Arc<AlarmRegistry>,
    catalog: Arc<ChallengeCatalog>,
    presence: Arc<PresenceMonitor>,
    actuator: Arc<dyn AlertActuator>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    idle_threshold: Duration,
    state: Mutex<SessionTable>,
}

#[derive(Default)]
struct SessionTable {
    sessions: BTreeMap<AlarmId, ActiveSession>,
    alerting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickReport {
    pub triggered: Vec<ActiveSession>,
    pub alerting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Graceful,
    Failed,
    Abandoned,
}

impl Scheduler {
    pub fn new(
        registry: Arc<AlarmRegistry>,
        catalog: Arc<ChallengeCatalog>,
        presence: Arc<PresenceMonitor>,
        actuator: Arc<dyn AlertActuator>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        idle_threshold: Duration,
    ) -> Self {
        Self {
            registry,
            catalog,
            presence,
            actuator,
            clock,
            events,
            idle_threshold,
            state: Mutex::new(SessionTable::default()),
        }
    }

    fn table(&self) -> MutexGuard<'_, SessionTable> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, body: EventBody) {
        match serde_json::to_value(&body) {
            Ok(value) => {
                self.events
                    .publish(EventRecord::new(EventSource::Scheduler, None, value));
            }
            Err(err) => tracing::warn!(error = %err, "failed to encode scheduler event"),
        }
    }

    /// Evaluates every alarm against the current minute. A challenge is drawn
    /// before the alarm is marked, so an empty catalog leaves the alarm
    /// eligible for the rest of its minute.
    pub fn tick(&self) -> Result<TickReport, SchedulerError> {
        let now = self.clock.now();
        let time = TimeOfDay::from_time(now.time());
        let today = now.date();

        let mut table = self.table();
        let mut triggered = Vec::new();
        for alarm in self.registry.list_active().into_values() {
            if !alarm.is_due(time, today) {
                continue;
            }
            if table.sessions.contains_key(&alarm.id) {
                // Yesterday's session is still unsolved; keep its challenge.
                self.registry.mark_triggered(&alarm.id, today);
                tracing::info!(alarm_id = %alarm.id, "alarm due again with a live session");
                continue;
            }
            let challenge = self.catalog.random_challenge()?;
            if !self.registry.mark_triggered(&alarm.id, today) {
                // Deleted between list and mark.
                continue;
            }
            let session = ActiveSession {
                alarm_id: alarm.id.clone(),
                time: alarm.time,
                challenge_name: challenge.name.clone(),
                triggered_at: now,
            };
            tracing::info!(
                alarm_id = %session.alarm_id,
                challenge = %session.challenge_name,
                "alarm triggered"
            );
            table.sessions.insert(alarm.id.clone(), session.clone());
            self.publish(EventBody::AlarmTriggered {
                session: session.clone(),
            });
            triggered.push(session);
        }
        self.update_alert(&mut table);
        Ok(TickReport {
            triggered,
            alerting: table.alerting,
        })
    }

    fn update_alert(&self, table: &mut SessionTable) {
        if table.sessions.is_empty() {
            self.actuator.stop();
            if table.alerting {
                table.alerting = false;
                self.publish(EventBody::AlertStopped);
            }
            return;
        }
        if self.presence.is_idle_beyond(self.idle_threshold) {
            self.actuator.start();
            if !table.alerting {
                table.alerting = true;
                self.publish(EventBody::AlertStarted);
            }
        }
    }

    /// The session with the smallest alarm id. Stable across calls while the
    /// table is unchanged; it does not reflect which alarm fired first.
    pub fn active_session(&self) -> Option<ActiveSession> {
        self.table()
            .sessions
            .first_key_value()
            .map(|(_, session)| session.clone())
    }

    pub fn sessions(&self) -> Vec<ActiveSession> {
        self.table().sessions.values().cloned().collect()
    }

    /// Returns `false` when `alarm_id` has no live session.
    pub fn clear(&self, alarm_id: &AlarmId) -> bool {
        let mut table = self.table();
        let removed = self.remove_session(&mut table, alarm_id, ClearReason::Cleared);
        if removed {
            self.update_alert(&mut table);
        }
        removed
    }

    /// Clears the current session when `result` is a full pass for the
    /// challenge bound to it. Returns the alarm that was satisfied.
    pub fn resolve(&self, challenge_name: &str, result: &HarnessResult) -> Option<AlarmId> {
        if !result.all_passed() {
            return None;
        }
        let mut table = self.table();
        let alarm_id = table
            .sessions
            .first_key_value()
            .filter(|(_, session)| session.challenge_name == challenge_name)
            .map(|(id, _)| id.clone())?;
        self.remove_session(&mut table, &alarm_id, ClearReason::Solved);
        self.update_alert(&mut table);
        Some(alarm_id)
    }

    fn remove_session(
        &self,
        table: &mut SessionTable,
        alarm_id: &AlarmId,
        reason: ClearReason,
    ) -> bool {
        if table.sessions.remove(alarm_id).is_none() {
            return false;
        }
        tracing::info!(alarm_id = %alarm_id, ?reason, "session cleared");
        self.publish(EventBody::SessionCleared {
            alarm_id: alarm_id.clone(),
            reason,
        });
        true
    }

    /// Silences the alert and resets the idle clock. Sessions stay live, so
    /// the alert returns once the user is idle past the threshold again.
    pub fn dismiss_alert(&self) {
        let mut table = self.table();
        self.actuator.stop();
        self.presence.record_activity();
        if table.alerting {
            table.alerting = false;
            self.publish(EventBody::AlertStopped);
        }
    }

    pub fn alert_active(&self) -> bool {
        self.table().alerting
    }

    /// Drops every session and stops the actuator.
    pub fn release(&self) {
        let mut table = self.table();
        let ids: Vec<AlarmId> = table.sessions.keys().cloned().collect();
        for id in ids {
            self.remove_session(&mut table, &id, ClearReason::Shutdown);
        }
        self.update_alert(&mut table);
    }

    pub fn spawn(self: &Arc<Self>, tick_interval: Duration) -> SchedulerHandle {
        let (stop, stop_rx) = watch::channel(false);
        let scheduler = Arc::clone(self);
        let task = tokio::spawn(scheduler.run(tick_interval, stop_rx));
        SchedulerHandle {
            scheduler: Arc::clone(self),
            stop,
            task,
        }
    }

    async fn run(self: Arc<Self>, tick_interval: Duration, mut stop: watch::Receiver<bool>) {
        tracing::info!(interval = ?tick_interval, "scheduler started");
        loop {
            if *stop.borrow() {
                break;
            }
            let delay = match self.tick() {
                Ok(report) => {
                    if !report.triggered.is_empty() {
                        tracing::debug!(count = report.triggered.len(), "tick triggered alarms");
                    }
                    tick_interval
                }
                Err(err) => {
                    tracing::error!(error = %err, "scheduler tick failed, backing off");
                    tick_interval * ERROR_BACKOFF_FACTOR
                }
            };
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::info!("scheduler stopped");
    }
}

pub struct SchedulerHandle {
    scheduler: Arc<Scheduler>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the loop, waits at most `grace` for it, and releases sessions
    /// and the actuator whatever the loop did.
    pub async fn shutdown(self, grace: Duration) -> ShutdownOutcome {
        let _ = self.stop.send(true);
        let mut task = self.task;
        let outcome = match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(())) => ShutdownOutcome::Graceful,
            Ok(Err(err)) => {
                tracing::error!(error = %err, "scheduler task failed");
                ShutdownOutcome::Failed
            }
            Err(_) => {
                tracing::warn!(?grace, "scheduler did not stop in time, abandoning it");
                task.abort();
                ShutdownOutcome::Abandoned
            }
        };
        self.scheduler.release();
        outcome
    }
}

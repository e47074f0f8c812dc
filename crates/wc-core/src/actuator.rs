use std::sync::atomic::{AtomicBool, Ordering};

/// The audible/visual alert. Both transitions are idempotent.
pub trait AlertActuator: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn is_active(&self) -> bool;
}

/// Default actuator: records the on/off state and logs transitions. Sound
/// playback is left to whatever watches the logs or the event stream.
#[derive(Debug, Default)]
pub struct LoggingActuator {
    active: AtomicBool,
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertActuator for LoggingActuator {
    fn start(&self) {
        if !self.active.swap(true, Ordering::AcqRel) {
            tracing::warn!("alarm alert started");
        }
    }

    fn stop(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            tracing::info!("alarm alert stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

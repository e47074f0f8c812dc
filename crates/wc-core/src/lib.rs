pub mod actuator;
pub mod alarms;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod presence;
pub mod scheduler;

pub mod types;

pub use crate::actuator::{AlertActuator, LoggingActuator};
pub use crate::alarms::AlarmRegistry;
pub use crate::catalog::ChallengeCatalog;
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::WakeConfig;
pub use crate::error::WakeError;
pub use crate::presence::PresenceMonitor;
pub use crate::scheduler::Scheduler;

pub mod alarm;
pub mod challenge;
pub mod event;
pub mod harness;
pub mod ids;
pub mod session;
pub mod time;

pub use alarm::Alarm;
pub use challenge::{Challenge, TestCase};
pub use event::{ClearReason, EventBody};
pub use harness::{HarnessResult, TestResult};
pub use ids::{AlarmId, IdError};
pub use session::ActiveSession;
pub use time::{TimeOfDay, TimeOfDayError};

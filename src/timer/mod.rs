pub mod arbiter;
pub mod clock;
pub mod controller;
pub mod display;
pub mod engine;
pub mod state;

pub use arbiter::{ExclusivityArbiter, Handoff};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{RoundSnapshot, TimerController, DEFAULT_TICK_INTERVAL};
pub use engine::{SegmentView, TimerEngine, TimerNotification, TimerObserver};
pub use state::{SegmentTimer, TimerStatus};

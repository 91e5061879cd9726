pub mod oneshot;
pub mod timer;

pub use oneshot::{CancelToken, OneShot, TimerToken};
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};

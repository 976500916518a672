pub mod time;
pub mod timer;

pub use time::{Timestamp, current_time_secs};
pub use timer::{TimerQueue, TimerToken};

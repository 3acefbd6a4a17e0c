//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (monotonic millisecond clocks)
//! - Input events (key codes to controls)
//!
//! Storage lives in [`crate::persistence`].

pub mod input;
pub mod time;

pub use input::{Control, control_for_key_down, control_for_key_up};
pub use time::{Clock, ManualClock, SystemClock};

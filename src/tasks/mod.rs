//! Background tasks module
//!
//! This module contains the per-timer countdown tasks.

pub mod countdown;

// Re-export main functions
pub use countdown::{countdown_task, TICK_PERIOD};

//! State management module
//!
//! The timer entity and its pure transitions live in `timer`; the
//! authoritative collection and its tick sources live in `app_state`.

pub mod app_state;
pub mod event;
pub mod timer;

// Re-export main types
pub use app_state::AppState;
pub use event::{EventKind, TimerEvent};
pub use timer::{
    calculate_progress, create_timer, format_time, DurationInput, StatusFilter, TickOutcome,
    Timer, TimerStatus,
};

//! meintimer - labeled countdown timers with looping, notifications and
//! persisted state
//!
//! The timer collection is owned by [`AppState`]; each running timer is
//! driven by its own one-second countdown task, and the whole collection is
//! written to a key-value store after every change.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{StorageError, TimerError};
pub use state::{AppState, Timer};
pub use utils::signals::shutdown_signal;

//! Side-effecting services used by the timer engine
//!
//! Currently this is only the notification emitter.

pub mod notifier;

pub use notifier::{Notice, Notify, RecordingNotifier, SoundNotifier};

//! Timer entity and the pure transitions applied to it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TimerError;

/// A single countdown timer.
///
/// Timers are treated as values: every change produces a new `Timer` which
/// replaces the old one in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: Uuid,
    pub label: String,
    /// Configured length in seconds
    pub duration: u64,
    /// Seconds left, always within `0..=duration`
    pub remaining: u64,
    pub is_running: bool,
    pub is_completed: bool,
    /// Restart instead of completing when the countdown reaches zero
    #[serde(rename = "loop", default)]
    pub looping: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of applying one tick to a running timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Remaining time went down by one second
    Decremented,
    /// A loop timer hit zero and started over
    Cycled,
    /// A non-loop timer hit zero and stopped
    Completed,
}

/// Display status of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Running,
    Paused,
    Completed,
}

/// Status filter applied when listing timers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    /// Check whether a timer passes this filter
    pub fn matches(&self, timer: &Timer) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !timer.is_completed,
            StatusFilter::Completed => timer.is_completed,
        }
    }
}

/// Duration as entered in the create form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationInput {
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
}

impl DurationInput {
    #[cfg(test)]
    pub fn new(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self { hours, minutes, seconds }
    }

    /// Sum the fields into seconds
    pub fn total_seconds(&self) -> Result<u64, TimerError> {
        self.hours
            .checked_mul(3600)
            .and_then(|h| self.minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(self.seconds))
            .ok_or(TimerError::DurationOverflow)
    }
}

/// Construct a new, stopped timer with its full duration remaining
pub fn create_timer(label: &str, duration: u64, looping: bool) -> Result<Timer, TimerError> {
    if duration == 0 {
        return Err(TimerError::InvalidDuration);
    }
    let label = label.trim();
    if label.is_empty() {
        return Err(TimerError::EmptyLabel);
    }

    Ok(Timer {
        id: Uuid::new_v4(),
        label: label.to_string(),
        duration,
        remaining: duration,
        is_running: false,
        is_completed: false,
        looping,
        created_at: Utc::now(),
    })
}

/// Render seconds as `M:SS`, or `H:MM:SS` from one hour up
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Elapsed share of the duration as a percentage in `0.0..=100.0`
pub fn calculate_progress(timer: &Timer) -> f64 {
    if timer.duration == 0 {
        return 0.0;
    }
    let elapsed = timer.duration as f64 - timer.remaining as f64;
    (elapsed / timer.duration as f64 * 100.0).clamp(0.0, 100.0)
}

impl Timer {
    pub fn status(&self) -> TimerStatus {
        if self.is_completed {
            TimerStatus::Completed
        } else if self.is_running {
            TimerStatus::Running
        } else {
            TimerStatus::Paused
        }
    }

    pub fn progress(&self) -> f64 {
        calculate_progress(self)
    }

    /// Apply one second of countdown
    pub fn tick(&self) -> (Timer, TickOutcome) {
        if self.remaining > 1 {
            let next = Timer {
                remaining: self.remaining - 1,
                ..self.clone()
            };
            return (next, TickOutcome::Decremented);
        }

        if self.looping {
            let next = Timer {
                remaining: self.duration,
                is_running: true,
                is_completed: false,
                ..self.clone()
            };
            (next, TickOutcome::Cycled)
        } else {
            let next = Timer {
                remaining: 0,
                is_running: false,
                is_completed: true,
                ..self.clone()
            };
            (next, TickOutcome::Completed)
        }
    }

    /// Start/pause toggle. A finished timer is re-armed from its full duration.
    pub fn toggled(&self) -> Timer {
        if self.is_completed && self.remaining == 0 {
            Timer {
                remaining: self.duration,
                is_running: true,
                is_completed: false,
                ..self.clone()
            }
        } else {
            Timer {
                is_running: !self.is_running,
                ..self.clone()
            }
        }
    }

    /// Whether a reset would change anything
    pub fn can_reset(&self) -> bool {
        !(self.remaining == self.duration && !self.is_running)
    }

    /// Back to full duration, stopped and not completed
    pub fn reset(&self) -> Timer {
        Timer {
            remaining: self.duration,
            is_running: false,
            is_completed: false,
            ..self.clone()
        }
    }

    /// Repair a record loaded from storage so the invariants hold
    pub fn normalized(&self) -> Timer {
        let mut timer = self.clone();
        timer.remaining = timer.remaining.min(timer.duration);
        if timer.looping {
            timer.is_completed = false;
            if timer.remaining == 0 {
                timer.remaining = timer.duration;
            }
        } else if timer.remaining == 0 || timer.is_completed {
            timer.remaining = 0;
            timer.is_completed = true;
        }
        if timer.is_completed {
            timer.is_running = false;
        }
        timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_timer_starts_stopped_at_full_duration() {
        for d in [1, 2, 59, 3600, 86_400] {
            for looping in [false, true] {
                let t = create_timer("Tea", d, looping).unwrap();
                assert_eq!(t.remaining, d);
                assert_eq!(t.duration, d);
                assert!(!t.is_running);
                assert!(!t.is_completed);
                assert_eq!(t.looping, looping);
            }
        }
    }

    #[test]
    fn create_timer_rejects_bad_input() {
        assert_eq!(create_timer("Tea", 0, false), Err(TimerError::InvalidDuration));
        assert_eq!(create_timer("   ", 10, false), Err(TimerError::EmptyLabel));
        assert_eq!(create_timer("", 0, false), Err(TimerError::InvalidDuration));
    }

    #[test]
    fn create_timer_trims_label() {
        let t = create_timer("  Focus  ", 10, false).unwrap();
        assert_eq!(t.label, "Focus");
    }

    #[test]
    fn format_time_examples() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(59), "0:59");
        assert_eq!(format_time(60), "1:00");
        assert_eq!(format_time(605), "10:05");
        assert_eq!(format_time(3599), "59:59");
        assert_eq!(format_time(3600), "1:00:00");
        assert_eq!(format_time(3661), "1:01:01");
        assert_eq!(format_time(36_000 + 65), "10:01:05");
    }

    #[test]
    fn progress_grows_as_remaining_shrinks() {
        let mut timer = create_timer("Run", 7, false).unwrap();
        let mut last = calculate_progress(&timer);
        assert_eq!(last, 0.0);
        while timer.remaining > 0 {
            timer.remaining -= 1;
            let p = calculate_progress(&timer);
            assert!(p >= last);
            assert!((0.0..=100.0).contains(&p));
            last = p;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn progress_handles_zero_duration() {
        let mut timer = create_timer("Run", 5, false).unwrap();
        timer.duration = 0;
        timer.remaining = 0;
        assert_eq!(calculate_progress(&timer), 0.0);
    }

    #[test]
    fn tick_decrements_then_completes() {
        let timer = Timer {
            is_running: true,
            ..create_timer("Eggs", 2, false).unwrap()
        };

        let (timer, outcome) = timer.tick();
        assert_eq!(outcome, TickOutcome::Decremented);
        assert_eq!(timer.remaining, 1);
        assert!(timer.is_running);

        let (timer, outcome) = timer.tick();
        assert_eq!(outcome, TickOutcome::Completed);
        assert_eq!(timer.remaining, 0);
        assert!(!timer.is_running);
        assert!(timer.is_completed);
    }

    #[test]
    fn tick_cycles_loop_timer() {
        let mut timer = Timer {
            is_running: true,
            ..create_timer("Stretch", 3, true).unwrap()
        };

        for _ in 0..4 {
            let (next, outcome) = timer.tick();
            assert_eq!(outcome, TickOutcome::Decremented);
            let (next, outcome) = next.tick();
            assert_eq!(outcome, TickOutcome::Decremented);
            let (next, outcome) = next.tick();
            assert_eq!(outcome, TickOutcome::Cycled);
            assert_eq!(next.remaining, 3);
            assert!(next.is_running);
            assert!(!next.is_completed);
            timer = next;
        }
    }

    #[test]
    fn toggle_flips_running_and_rearms_finished_timer() {
        let timer = create_timer("Pasta", 5, false).unwrap();
        let started = timer.toggled();
        assert!(started.is_running);
        let paused = started.toggled();
        assert!(!paused.is_running);

        let finished = Timer {
            remaining: 0,
            is_completed: true,
            ..timer
        };
        let rearmed = finished.toggled();
        assert_eq!(rearmed.remaining, 5);
        assert!(rearmed.is_running);
        assert!(!rearmed.is_completed);
    }

    #[test]
    fn reset_discards_progress() {
        let timer = Timer {
            remaining: 4,
            is_running: true,
            ..create_timer("Bread", 10, false).unwrap()
        };
        assert!(timer.can_reset());
        let reset = timer.reset();
        assert_eq!(reset.remaining, 10);
        assert!(!reset.is_running);
        assert!(!reset.is_completed);
        assert!(!reset.can_reset());
    }

    #[test]
    fn status_filter_selects_by_completion() {
        let active = create_timer("A", 5, false).unwrap();
        let done = Timer {
            remaining: 0,
            is_completed: true,
            ..create_timer("B", 5, false).unwrap()
        };

        assert!(StatusFilter::All.matches(&active) && StatusFilter::All.matches(&done));
        assert!(StatusFilter::Active.matches(&active) && !StatusFilter::Active.matches(&done));
        assert!(!StatusFilter::Completed.matches(&active) && StatusFilter::Completed.matches(&done));
    }

    #[test]
    fn duration_input_sums_fields() {
        assert_eq!(DurationInput::new(1, 1, 1).total_seconds(), Ok(3661));
        assert_eq!(DurationInput::default().total_seconds(), Ok(0));
        assert_eq!(
            DurationInput::new(u64::MAX, 0, 0).total_seconds(),
            Err(TimerError::DurationOverflow)
        );
    }

    #[test]
    fn legacy_record_without_loop_deserializes() {
        let json = r#"{
            "id": "6f1c2a34-8d1b-4c55-9a1e-2b3c4d5e6f70",
            "label": "Old",
            "duration": 30,
            "remaining": 12,
            "isRunning": false,
            "isCompleted": false,
            "createdAt": "2024-03-01T10:00:00.000Z"
        }"#;
        let timer: Timer = serde_json::from_str(json).unwrap();
        assert!(!timer.looping);
        assert_eq!(timer.remaining, 12);
        assert_eq!(timer.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn normalized_restores_invariants() {
        let base = create_timer("N", 10, true).unwrap();
        let broken = Timer {
            remaining: 0,
            is_completed: true,
            is_running: true,
            ..base
        };
        let fixed = broken.normalized();
        assert!(!fixed.is_completed);
        assert_eq!(fixed.remaining, 10);

        let overfull = Timer {
            remaining: 99,
            looping: false,
            ..fixed
        };
        assert_eq!(overfull.normalized().remaining, 10);
    }

    #[test]
    fn normalized_completed_timer_sits_at_zero() {
        let stale = Timer {
            remaining: 5,
            is_completed: true,
            is_running: true,
            ..create_timer("Done", 10, false).unwrap()
        };
        let fixed = stale.normalized();
        assert_eq!(fixed.remaining, 0);
        assert!(fixed.is_completed);
        assert!(!fixed.is_running);

        // Toggling a repaired record restarts it instead of running it completed
        let restarted = fixed.toggled();
        assert_eq!(restarted.remaining, 10);
        assert!(restarted.is_running);
        assert!(!restarted.is_completed);
    }
}

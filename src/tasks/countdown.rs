//! Per-timer countdown task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{AppState, TickOutcome};

/// Time between two ticks of a running timer
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Tick the timer `id` once per second until it stops, completes or is
/// deleted. `generation` identifies this task to the controller, which
/// discards ticks from tasks it has since replaced.
pub async fn countdown_task(state: Arc<AppState>, id: Uuid, generation: u64) {
    debug!("Starting countdown task for {} (generation {})", id, generation);

    // First tick one full period after arming
    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    // Late ticks are not made up
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match state.tick(id, generation) {
            Some(TickOutcome::Decremented) | Some(TickOutcome::Cycled) => {}
            Some(TickOutcome::Completed) => {
                info!("Countdown for {} finished", id);
                break;
            }
            None => {
                debug!("Countdown task for {} (generation {}) retired", id, generation);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{Notice, RecordingNotifier},
        state::EventKind,
        storage::{self, MemoryStore},
    };

    fn new_state() -> (Arc<AppState>, Arc<MemoryStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let state = Arc::new(AppState::new(
            store.clone(),
            notifier.clone(),
            "127.0.0.1".to_string(),
            0,
        ));
        (state, store, notifier)
    }

    /// Let the clock run for `secs` ticks plus a little slack
    async fn advance_ticks(secs: u64) {
        for _ in 0..secs {
            tokio::time::sleep(TICK_PERIOD).await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn non_loop_timer_completes_after_duration() {
        let (state, _, notifier) = new_state();
        let timer = state.create("Eggs", 2, false).unwrap();
        state.toggle(timer.id).unwrap();

        advance_ticks(1).await;
        assert_eq!(state.get(timer.id).unwrap().remaining, 1);

        advance_ticks(1).await;
        let done = state.get(timer.id).unwrap();
        assert_eq!(done.remaining, 0);
        assert!(!done.is_running);
        assert!(done.is_completed);

        advance_ticks(5).await;
        assert_eq!(notifier.notices(), [Notice::Finished { label: "Eggs".into() }]);
        assert!(!state.is_ticking(timer.id));
    }

    #[tokio::test(start_paused = true)]
    async fn loop_timer_cycles_indefinitely() {
        let (state, _, notifier) = new_state();
        let timer = state.create("Stretch", 3, true).unwrap();
        state.toggle(timer.id).unwrap();
        let mut events = state.subscribe();

        for cycle in 1..=4 {
            advance_ticks(3).await;
            let current = state.get(timer.id).unwrap();
            assert_eq!(current.remaining, 3);
            assert!(current.is_running);
            assert!(!current.is_completed);
            assert_eq!(notifier.notices().len(), cycle);

            let event = events.try_recv().unwrap();
            assert_eq!(event.kind, EventKind::Cycled);
            assert_eq!(event.title, "Cycle completed");
        }
        assert!(notifier
            .notices()
            .iter()
            .all(|n| matches!(n, Notice::CycleCompleted { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticks_and_resume_continues() {
        let (state, _, _) = new_state();
        let timer = state.create("Pause", 10, false).unwrap();
        state.toggle(timer.id).unwrap();

        advance_ticks(3).await;
        state.toggle(timer.id).unwrap();
        advance_ticks(5).await;
        assert_eq!(state.get(timer.id).unwrap().remaining, 7);

        state.toggle(timer.id).unwrap();
        advance_ticks(2).await;
        assert_eq!(state.get(timer.id).unwrap().remaining, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_toggles_keep_a_single_tick_source() {
        let (state, _, _) = new_state();
        let timer = state.create("Rapid", 20, false).unwrap();
        for _ in 0..5 {
            state.toggle(timer.id).unwrap();
        }
        assert!(state.get(timer.id).unwrap().is_running);

        advance_ticks(4).await;
        assert_eq!(state.get(timer.id).unwrap().remaining, 16);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_mid_countdown_restores_duration() {
        let (state, _, _) = new_state();
        let timer = state.create("Bread", 10, false).unwrap();
        state.toggle(timer.id).unwrap();

        advance_ticks(6).await;
        assert_eq!(state.get(timer.id).unwrap().remaining, 4);

        let reset = state.reset(timer.id).unwrap();
        assert_eq!(reset.remaining, 10);
        assert!(!reset.is_running);
        assert!(!reset.is_completed);

        advance_ticks(3).await;
        assert_eq!(state.get(timer.id).unwrap().remaining, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_mid_countdown_stops_ticks() {
        let (state, store, _) = new_state();
        let keep = state.create("Keep", 30, false).unwrap();
        let gone = state.create("Gone", 30, false).unwrap();
        state.toggle(gone.id).unwrap();

        advance_ticks(2).await;
        state.delete(gone.id).unwrap();
        assert!(!state.is_ticking(gone.id));

        advance_ticks(3).await;
        let saved = storage::load_timers(store.as_ref());
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, keep.id);
        assert_eq!(saved[0].remaining, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_finished_timer_counts_down_again() {
        let (state, _, notifier) = new_state();
        let timer = state.create("Again", 1, false).unwrap();
        state.toggle(timer.id).unwrap();
        advance_ticks(1).await;
        assert!(state.get(timer.id).unwrap().is_completed);

        let rearmed = state.toggle(timer.id).unwrap();
        assert_eq!(rearmed.remaining, 1);
        assert!(rearmed.is_running);

        advance_ticks(1).await;
        assert!(state.get(timer.id).unwrap().is_completed);
        assert_eq!(notifier.notices().len(), 2);
    }
}

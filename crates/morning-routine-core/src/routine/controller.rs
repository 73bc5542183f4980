//! Routine controller.
//!
//! Owns today's completion map and the timer engine, and persists through
//! the [`ProgressStore`] after every mutation. Every operation returns the
//! events it produced, in order.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::completed::CompletedTasks;
use super::task::{Routine, TaskId};
use crate::clock::{Clock, DateKey};
use crate::events::Event;
use crate::storage::{KeyValueStore, ProgressStore};
use crate::streak::{Stats, StreakOutcome};
use crate::timer::TimerEngine;

pub struct RoutineController<S> {
    routine: Routine,
    progress: ProgressStore<S>,
    day: DateKey,
    completed: CompletedTasks,
    stats: Stats,
    timer: TimerEngine,
}

impl<S: KeyValueStore> RoutineController<S> {
    /// Load today's progress and stats from `store`.
    pub fn new(routine: Routine, store: S, clock: Arc<dyn Clock>) -> Self {
        let progress = ProgressStore::new(store, clock, &routine);
        let day = progress.today_key();
        let completed = progress.load_progress(day);
        let stats = progress.load_stats();
        debug!(%day, completed = completed.count(), "Routine loaded");
        Self {
            routine,
            progress,
            day,
            completed,
            stats,
            timer: TimerEngine::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    pub fn completed(&self) -> &CompletedTasks {
        &self.completed
    }

    pub fn is_completed(&self, id: TaskId) -> bool {
        self.completed.is_completed(id)
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// The day the in-memory completion map belongs to.
    pub fn day(&self) -> DateKey {
        self.day
    }

    pub fn last_completed_date(&self) -> Option<DateKey> {
        self.progress.last_completed_date()
    }

    pub fn total_tasks(&self) -> usize {
        self.routine.len()
    }

    pub fn total_completed(&self) -> usize {
        self.routine
            .ids()
            .filter(|id| self.completed.is_completed(*id))
            .count()
    }

    /// 0.0 .. 100.0, zero for an empty routine.
    pub fn progress_percentage(&self) -> f64 {
        let total = self.total_tasks();
        if total == 0 {
            return 0.0;
        }
        self.total_completed() as f64 / total as f64 * 100.0
    }

    pub fn is_fully_complete(&self) -> bool {
        self.completed.covers(&self.routine)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            day: self.day,
            timer_state: self.timer.state(),
            active_task_id: self.timer.active_task(),
            remaining_secs: self.timer.remaining_secs(),
            completed: self.completed.ids().collect(),
            total_completed: self.total_completed(),
            total_tasks: self.total_tasks(),
            progress_pct: self.progress_percentage(),
            stats: self.stats,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Flip completion of task `id` and persist. Unknown ids are ignored.
    pub fn toggle_task(&mut self, id: TaskId) -> Vec<Event> {
        let mut events = self.refresh_day().into_iter().collect::<Vec<_>>();
        if !self.known(id) {
            return events;
        }

        let completed = self.completed.toggle(id);
        debug!(task_id = id, completed, "Task toggled");
        events.push(Event::TaskToggled {
            task_id: id,
            completed,
            at: Utc::now(),
        });
        self.persist(&mut events);
        events
    }

    /// Start the countdown for task `id` using its catalogue duration.
    pub fn start_timer(&mut self, id: TaskId) -> Vec<Event> {
        match self.routine.get(id) {
            Some(task) => {
                let duration = task.duration_min;
                self.start_timer_with(id, duration)
            }
            None => {
                debug!(task_id = id, "Ignoring timer start for unknown task");
                Vec::new()
            }
        }
    }

    /// Start the countdown for task `id` with an explicit duration.
    ///
    /// Starting the task that is already running pauses it instead.
    pub fn start_timer_with(&mut self, id: TaskId, duration_min: f64) -> Vec<Event> {
        let mut events = self.refresh_day().into_iter().collect::<Vec<_>>();
        if !self.known(id) {
            return events;
        }
        if let Some(previous) = self.timer.active_task().filter(|t| *t != id) {
            debug!(abandoned = previous, task_id = id, "Switching timer task");
        }
        events.extend(self.timer.start(id, duration_min));
        events
    }

    pub fn pause_timer(&mut self) -> Vec<Event> {
        self.timer.pause().into_iter().collect()
    }

    pub fn resume_timer(&mut self) -> Vec<Event> {
        self.timer.resume().into_iter().collect()
    }

    pub fn reset_timer(&mut self) -> Vec<Event> {
        self.timer.reset().into_iter().collect()
    }

    /// Clear today's progress and stop the timer. Stats are kept.
    pub fn reset_routine(&mut self) -> Vec<Event> {
        let mut events = self.refresh_day().into_iter().collect::<Vec<_>>();
        self.completed.clear();
        events.extend(self.timer.reset());
        self.progress.reset_day(self.day);
        events.push(Event::RoutineReset {
            day: self.day,
            at: Utc::now(),
        });
        events
    }

    /// Deliver one second to the timer. When the countdown expires the
    /// active task is marked complete and persisted.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = self.refresh_day().into_iter().collect::<Vec<_>>();
        let Some(event) = self.timer.tick() else {
            return events;
        };

        let finished = match &event {
            Event::TimerCompleted { task_id, .. } => Some(*task_id),
            _ => None,
        };
        events.push(event);

        if let Some(id) = finished {
            info!(task_id = id, "Timer finished");
            if self.completed.mark(id) {
                events.push(Event::TaskToggled {
                    task_id: id,
                    completed: true,
                    at: Utc::now(),
                });
                self.persist(&mut events);
            }
        }
        events
    }

    /// Swap in the new day's progress if the calendar moved on.
    ///
    /// A running countdown is left alone; if it finishes it counts for the
    /// new day.
    pub fn refresh_day(&mut self) -> Option<Event> {
        let today = self.progress.today_key();
        if today == self.day {
            return None;
        }
        let from = self.day;
        self.day = today;
        self.completed = self.progress.load_progress(today);
        self.stats = self.progress.load_stats();
        info!(%from, to = %today, "Day rolled over");
        Some(Event::DayRolledOver {
            from,
            to: today,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn known(&self, id: TaskId) -> bool {
        let known = self.routine.contains(id);
        if !known {
            debug!(task_id = id, "Ignoring unknown task id");
        }
        known
    }

    fn persist(&mut self, events: &mut Vec<Event>) {
        let outcome = self.progress.save_progress(self.day, &self.completed);
        self.stats = self.progress.load_stats();
        if let Some(StreakOutcome::Continued(stats) | StreakOutcome::Restarted(stats)) = outcome {
            events.push(Event::StreakCredited {
                day: self.day,
                stats,
                at: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;
    use crate::timer::TimerState;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn controller(day: &str) -> (RoutineController<MemoryStore>, MemoryStore, FixedClock) {
        let store = MemoryStore::new();
        let clock = FixedClock::new(key(day));
        let c = RoutineController::new(Routine::morning(), store.clone(), Arc::new(clock.clone()));
        (c, store, clock)
    }

    fn complete_all(c: &mut RoutineController<MemoryStore>) {
        let ids: Vec<_> = c.routine().ids().collect();
        for id in ids {
            if !c.is_completed(id) {
                c.toggle_task(id);
            }
        }
    }

    #[test]
    fn fresh_controller_is_empty() {
        let (c, _, _) = controller("2024-06-10");
        assert_eq!(c.total_completed(), 0);
        assert_eq!(c.progress_percentage(), 0.0);
        assert!(!c.is_fully_complete());
        assert_eq!(c.stats(), Stats::default());
        assert_eq!(c.timer().state(), TimerState::Idle);
    }

    #[test]
    fn toggle_persists_every_change() {
        let (mut c, store, _) = controller("2024-06-10");
        c.toggle_task(3);
        assert_eq!(
            store.get("morning-routine-2024-06-10").unwrap().as_deref(),
            Some(r#"{"3":true}"#)
        );
        c.toggle_task(3);
        assert_eq!(
            store.get("morning-routine-2024-06-10").unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn progress_is_reloaded_on_restart() {
        let (mut c, store, clock) = controller("2024-06-10");
        c.toggle_task(1);
        c.toggle_task(2);
        let reopened = RoutineController::new(Routine::morning(), store, Arc::new(clock));
        assert_eq!(reopened.total_completed(), 2);
    }

    #[test]
    fn unknown_task_id_is_ignored() {
        let (mut c, store, _) = controller("2024-06-10");
        assert!(c.toggle_task(99).is_empty());
        assert!(c.start_timer(99).is_empty());
        assert!(store.is_empty());
        assert!(c.timer().is_idle());
    }

    #[test]
    fn percentage_and_full_completion() {
        let (mut c, _, _) = controller("2024-06-10");
        c.toggle_task(1);
        let expected = 100.0 / 7.0;
        assert!((c.progress_percentage() - expected).abs() < 1e-9);
        complete_all(&mut c);
        assert!(c.is_fully_complete());
        assert_eq!(c.progress_percentage(), 100.0);
    }

    #[test]
    fn empty_routine_reports_zero_percent() {
        let routine = Routine::from_tasks(Vec::new()).unwrap();
        let clock = Arc::new(FixedClock::new(key("2024-06-10")));
        let c = RoutineController::new(routine, MemoryStore::new(), clock);
        assert_eq!(c.progress_percentage(), 0.0);
    }

    #[test]
    fn completing_the_day_credits_the_streak() {
        let (mut c, _, _) = controller("2024-06-10");
        let ids: Vec<_> = c.routine().ids().collect();
        let (last, rest) = ids.split_last().unwrap();
        for id in rest {
            c.toggle_task(*id);
        }
        let events = c.toggle_task(*last);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::StreakCredited { .. })));
        assert_eq!(c.stats().current_streak, 1);
        assert_eq!(c.stats().completed_days, 1);
    }

    #[test]
    fn recompleting_same_day_does_not_double_count() {
        let (mut c, _, _) = controller("2024-06-10");
        complete_all(&mut c);
        c.toggle_task(4);
        let events = c.toggle_task(4);
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::StreakCredited { .. })));
        assert_eq!(c.stats().completed_days, 1);
        assert_eq!(c.stats().current_streak, 1);
    }

    #[test]
    fn streak_continues_from_yesterday() {
        let (mut c, mut store, _) = controller("2024-06-10");
        store
            .set("morning-routine-stats", r#"{"streak":4,"bestStreak":6,"completedDays":9}"#)
            .unwrap();
        store.set("last-completed-date", "2024-06-09").unwrap();
        complete_all(&mut c);
        assert_eq!(c.stats().current_streak, 5);
        assert_eq!(c.stats().best_streak, 6);
        assert_eq!(c.stats().completed_days, 10);
    }

    #[test]
    fn streak_restarts_after_gap() {
        let (mut c, mut store, _) = controller("2024-06-10");
        store
            .set("morning-routine-stats", r#"{"streak":4,"bestStreak":6,"completedDays":9}"#)
            .unwrap();
        store.set("last-completed-date", "2024-06-05").unwrap();
        complete_all(&mut c);
        assert_eq!(c.stats().current_streak, 1);
        assert_eq!(c.stats().best_streak, 6);
    }

    #[test]
    fn reset_clears_progress_and_timer_but_keeps_stats() {
        let (mut c, store, _) = controller("2024-06-10");
        complete_all(&mut c);
        c.toggle_task(2);
        c.start_timer(2);
        c.reset_routine();
        assert_eq!(c.total_completed(), 0);
        assert!(c.timer().is_idle());
        assert!(store.get("morning-routine-2024-06-10").unwrap().is_none());
        assert_eq!(c.stats().completed_days, 1);
    }

    #[test]
    fn timer_expiry_marks_task_complete() {
        let (mut c, store, _) = controller("2024-06-10");
        // Task 1 is a one-minute task.
        c.start_timer(1);
        for _ in 0..59 {
            c.tick();
        }
        assert_eq!(c.timer().state(), TimerState::Running);
        assert_eq!(c.timer().remaining_secs(), 1);
        assert!(!c.is_completed(1));

        let events = c.tick();
        assert!(matches!(events[0], Event::TimerCompleted { task_id: 1, .. }));
        assert!(c.timer().is_idle());
        assert!(c.is_completed(1));
        assert_eq!(
            store.get("morning-routine-2024-06-10").unwrap().as_deref(),
            Some(r#"{"1":true}"#)
        );
    }

    #[test]
    fn timer_expiry_keeps_already_completed_task() {
        let (mut c, _, _) = controller("2024-06-10");
        c.toggle_task(1);
        c.start_timer_with(1, 0.05);
        for _ in 0..3 {
            c.tick();
        }
        assert!(c.timer().is_idle());
        assert!(c.is_completed(1));
    }

    #[test]
    fn switching_timers_gives_no_credit_to_abandoned_task() {
        let (mut c, _, _) = controller("2024-06-10");
        c.start_timer(1);
        for _ in 0..30 {
            c.tick();
        }
        c.start_timer(6);
        for _ in 0..60 {
            c.tick();
        }
        assert!(!c.is_completed(1));
        assert_eq!(c.timer().active_task(), Some(6));
        assert_eq!(c.timer().remaining_secs(), 60);
    }

    #[test]
    fn day_rollover_swaps_progress() {
        let (mut c, _, clock) = controller("2024-06-10");
        c.toggle_task(1);
        clock.advance_days(1);
        let events = c.toggle_task(2);
        assert!(matches!(events[0], Event::DayRolledOver { .. }));
        assert_eq!(c.day(), key("2024-06-11"));
        assert!(!c.is_completed(1));
        assert!(c.is_completed(2));
    }

    #[test]
    fn timer_running_across_midnight_credits_new_day() {
        let (mut c, store, clock) = controller("2024-06-10");
        c.start_timer_with(5, 0.05);
        c.tick();
        clock.advance_days(1);
        c.tick();
        c.tick();
        assert!(c.is_completed(5));
        assert!(store.get("morning-routine-2024-06-11").unwrap().is_some());
        assert!(store.get("morning-routine-2024-06-10").unwrap().is_none());
    }

    /// Reports `first` for the first `calls` reads, the next day after.
    struct MidnightClock {
        first: DateKey,
        calls: AtomicUsize,
        limit: usize,
    }

    impl Clock for MidnightClock {
        fn today(&self) -> DateKey {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.limit {
                self.first
            } else {
                self.first.tomorrow()
            }
        }
    }

    #[test]
    fn midnight_during_an_operation_writes_the_operation_day() {
        let mut store = MemoryStore::new();
        store
            .set("morning-routine-2024-06-10", r#"{"1":true,"2":true}"#)
            .unwrap();
        // One read at load, one when the toggle checks the day.
        let clock = Arc::new(MidnightClock {
            first: key("2024-06-10"),
            calls: AtomicUsize::new(0),
            limit: 2,
        });
        let mut c = RoutineController::new(Routine::morning(), store.clone(), clock);

        c.toggle_task(3);
        assert_eq!(c.day(), key("2024-06-10"));
        assert_eq!(
            store.get("morning-routine-2024-06-10").unwrap().as_deref(),
            Some(r#"{"1":true,"2":true,"3":true}"#)
        );
        assert!(store.get("morning-routine-2024-06-11").unwrap().is_none());
    }

    #[test]
    fn midnight_during_reset_clears_the_operation_day() {
        let mut store = MemoryStore::new();
        store
            .set("morning-routine-2024-06-10", r#"{"4":true}"#)
            .unwrap();
        store.set("morning-routine-2024-06-11", r#"{"5":true}"#).unwrap();
        let clock = Arc::new(MidnightClock {
            first: key("2024-06-10"),
            calls: AtomicUsize::new(0),
            limit: 2,
        });
        let mut c = RoutineController::new(Routine::morning(), store.clone(), clock);

        c.reset_routine();
        assert!(store.get("morning-routine-2024-06-10").unwrap().is_none());
        assert!(store.get("morning-routine-2024-06-11").unwrap().is_some());
    }

    proptest! {
        #[test]
        fn toggle_parity_decides_membership(toggles in proptest::collection::vec(1u32..=7, 0..60)) {
            let (mut c, _, _) = controller("2024-06-10");
            for id in &toggles {
                c.toggle_task(*id);
            }
            for id in 1u32..=7 {
                let count = toggles.iter().filter(|t| **t == id).count();
                prop_assert_eq!(c.is_completed(id), count % 2 == 1);
            }
        }

        #[test]
        fn reset_always_yields_empty_idle(toggles in proptest::collection::vec(1u32..=7, 0..20), timer in proptest::option::of(1u32..=7)) {
            let (mut c, _, _) = controller("2024-06-10");
            for id in &toggles {
                c.toggle_task(*id);
            }
            if let Some(id) = timer {
                c.start_timer(id);
                c.tick();
            }
            c.reset_routine();
            prop_assert_eq!(c.total_completed(), 0);
            prop_assert!(c.timer().is_idle());
        }
    }
}

//! Task countdown engine.
//!
//! The engine holds at most one countdown. It does not keep time itself:
//! the caller delivers one `tick()` per elapsed second (see [`Ticker`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --tick x N--> (expired) --> Idle
//!                  |   ^
//!            pause |   | resume
//!                  v   |
//!                 Paused
//! ```
//!
//! `start` on the task that is already running pauses it. `start` in any
//! other situation (re)starts the countdown from the full duration,
//! abandoning whatever was in progress. `reset` returns to `Idle` from
//! anywhere.
//!
//! [`Ticker`]: super::Ticker

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::routine::{minutes_to_secs, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerState,
    active_task: Option<TaskId>,
    remaining_secs: u64,
    /// Bumped on every transition into `Running`.
    run_id: u64,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            active_task: None,
            remaining_secs: 0,
            run_id: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn active_task(&self) -> Option<TaskId> {
        self.active_task
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_idle(&self) -> bool {
        self.state == TimerState::Idle
    }

    /// Identifies the current run. Changes whenever the engine (re)enters
    /// `Running`, so a tick source bound to an older run is stale.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or toggle-pause) the countdown for `task_id`.
    pub fn start(&mut self, task_id: TaskId, duration_min: f64) -> Option<Event> {
        if self.state == TimerState::Running && self.active_task == Some(task_id) {
            return self.pause();
        }

        let secs = minutes_to_secs(duration_min);
        self.active_task = Some(task_id);
        self.remaining_secs = secs;
        self.enter_running();
        Some(Event::TimerStarted {
            task_id,
            duration_secs: secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        match (self.state, self.active_task) {
            (TimerState::Running, Some(task_id)) => {
                self.state = TimerState::Paused;
                Some(Event::TimerPaused {
                    task_id,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Continue a paused countdown from where it stopped.
    pub fn resume(&mut self) -> Option<Event> {
        match (self.state, self.active_task) {
            (TimerState::Paused, Some(task_id)) if self.remaining_secs > 0 => {
                self.enter_running();
                Some(Event::TimerResumed {
                    task_id,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.go_idle();
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `TimerTicked` while time remains and `TimerCompleted` on the
    /// tick that reaches zero, at which point the engine is already `Idle`.
    /// Does nothing unless `Running`.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running || self.remaining_secs == 0 {
            return None;
        }
        let task_id = self.active_task?;

        self.remaining_secs -= 1;
        if self.remaining_secs > 0 {
            return Some(Event::TimerTicked {
                task_id,
                remaining_secs: self.remaining_secs,
            });
        }

        self.go_idle();
        Some(Event::TimerCompleted {
            task_id,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter_running(&mut self) {
        self.state = TimerState::Running;
        self.run_id = self.run_id.wrapping_add(1);
    }

    fn go_idle(&mut self) {
        self.state = TimerState::Idle;
        self.active_task = None;
        self.remaining_secs = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_pause_resume() {
        let mut engine = TimerEngine::new();
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start(1, 1.0).is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.remaining_secs(), 60);

        assert!(engine.pause().is_some());
        assert_eq!(engine.state(), TimerState::Paused);

        assert!(engine.resume().is_some());
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn starting_running_task_pauses_it() {
        let mut engine = TimerEngine::new();
        engine.start(4, 1.0);
        engine.tick();
        let event = engine.start(4, 1.0);
        assert!(matches!(
            event,
            Some(Event::TimerPaused { task_id: 4, remaining_secs: 59, .. })
        ));
        assert_eq!(engine.state(), TimerState::Paused);
        assert_eq!(engine.active_task(), Some(4));
    }

    #[test]
    fn starting_paused_task_restarts_full_duration() {
        let mut engine = TimerEngine::new();
        engine.start(4, 1.0);
        for _ in 0..10 {
            engine.tick();
        }
        engine.pause();
        engine.start(4, 1.0);
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.remaining_secs(), 60);
    }

    #[test]
    fn resume_continues_from_remaining() {
        let mut engine = TimerEngine::new();
        engine.start(4, 1.0);
        for _ in 0..10 {
            engine.tick();
        }
        engine.pause();
        engine.resume();
        assert_eq!(engine.remaining_secs(), 50);
    }

    #[test]
    fn switching_tasks_abandons_previous_countdown() {
        let mut engine = TimerEngine::new();
        engine.start(1, 1.0);
        engine.tick();
        engine.start(2, 0.5);
        assert_eq!(engine.active_task(), Some(2));
        assert_eq!(engine.remaining_secs(), 30);
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn sixty_ticks_complete_one_minute() {
        let mut engine = TimerEngine::new();
        engine.start(7, 1.0);
        for _ in 0..59 {
            assert!(matches!(engine.tick(), Some(Event::TimerTicked { .. })));
        }
        assert_eq!(engine.remaining_secs(), 1);
        assert!(engine.is_running());

        let last = engine.tick();
        assert!(matches!(last, Some(Event::TimerCompleted { task_id: 7, .. })));
        assert!(engine.is_idle());
        assert_eq!(engine.active_task(), None);
        assert_eq!(engine.remaining_secs(), 0);
    }

    #[test]
    fn tick_ignored_unless_running() {
        let mut engine = TimerEngine::new();
        assert!(engine.tick().is_none());
        engine.start(1, 1.0);
        engine.pause();
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 60);
    }

    #[test]
    fn reset_goes_idle_from_any_state() {
        let mut engine = TimerEngine::new();
        engine.start(1, 1.0);
        engine.reset();
        assert!(engine.is_idle());
        engine.start(1, 1.0);
        engine.pause();
        engine.reset();
        assert!(engine.is_idle());
        assert_eq!(engine.active_task(), None);
    }

    #[test]
    fn run_id_changes_on_every_run() {
        let mut engine = TimerEngine::new();
        let initial = engine.run_id();
        engine.start(1, 1.0);
        let first = engine.run_id();
        assert_ne!(first, initial);
        engine.tick();
        assert_eq!(engine.run_id(), first);
        engine.pause();
        engine.resume();
        assert_ne!(engine.run_id(), first);
    }
}

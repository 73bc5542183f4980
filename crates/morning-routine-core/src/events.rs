use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::DateKey;
use crate::routine::TaskId;
use crate::streak::Stats;
use crate::timer::TimerState;

/// Every state change in the routine core produces an Event.
/// Presentation layers render from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        task_id: TaskId,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        task_id: TaskId,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        task_id: TaskId,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerTicked {
        task_id: TaskId,
        remaining_secs: u64,
    },
    /// Countdown reached zero; the task has been marked complete.
    TimerCompleted {
        task_id: TaskId,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    TaskToggled {
        task_id: TaskId,
        completed: bool,
        at: DateTime<Utc>,
    },
    RoutineReset {
        day: DateKey,
        at: DateTime<Utc>,
    },
    /// A fully completed day was credited to the streak.
    StreakCredited {
        day: DateKey,
        stats: Stats,
        at: DateTime<Utc>,
    },
    /// The calendar day changed under a live session.
    DayRolledOver {
        from: DateKey,
        to: DateKey,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        day: DateKey,
        timer_state: TimerState,
        active_task_id: Option<TaskId>,
        remaining_secs: u64,
        completed: Vec<TaskId>,
        total_completed: usize,
        total_tasks: usize,
        progress_pct: f64,
        stats: Stats,
        at: DateTime<Utc>,
    },
}

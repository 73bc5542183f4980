//! Date-keyed routine progress and streak persistence.
//!
//! Storage layout (all values are strings):
//!
//! ```text
//! morning-routine-<YYYY-MM-DD>  -> {"<task id>": true, ...}
//! morning-routine-stats         -> {"streak": n, "bestStreak": n, "completedDays": n}
//! last-completed-date           -> YYYY-MM-DD
//! ```
//!
//! Nothing here returns an error. An unavailable store or a malformed value
//! is logged and treated as "no data", so callers always get a usable
//! default.

use std::sync::Arc;

use serde::de::{self, DeserializeOwned, Unexpected};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::KeyValueStore;
use crate::clock::{Clock, DateKey};
use crate::routine::{CompletedTasks, Routine, TaskId};
use crate::streak::{self, Stats, StreakOutcome};

const PROGRESS_PREFIX: &str = "morning-routine-";
pub const STATS_KEY: &str = "morning-routine-stats";
pub const LAST_COMPLETED_KEY: &str = "last-completed-date";

/// Storage key for one day's completion map.
pub fn progress_key(day: DateKey) -> String {
    format!("{PROGRESS_PREFIX}{day}")
}

pub struct ProgressStore<S> {
    store: S,
    clock: Arc<dyn Clock>,
    required: Vec<TaskId>,
}

impl<S: KeyValueStore> ProgressStore<S> {
    /// Create an adapter over `store` for the tasks of `routine`.
    pub fn new(store: S, clock: Arc<dyn Clock>, routine: &Routine) -> Self {
        Self {
            store,
            clock,
            required: routine.ids().collect(),
        }
    }

    pub fn today_key(&self) -> DateKey {
        self.clock.today()
    }

    pub fn load_today_progress(&self) -> CompletedTasks {
        self.load_progress(self.today_key())
    }

    /// Completion map for an arbitrary day, empty when absent or unreadable.
    pub fn load_progress(&self, day: DateKey) -> CompletedTasks {
        self.read_json(&progress_key(day)).unwrap_or_default()
    }

    pub fn save_today_progress(&mut self, progress: &CompletedTasks) -> Option<StreakOutcome> {
        self.save_progress(self.today_key(), progress)
    }

    /// Persist the completion map of `day`.
    ///
    /// When the map covers every task, `day` is credited to the streak.
    /// Returns the streak outcome in that case, `None` otherwise.
    pub fn save_progress(&mut self, day: DateKey, progress: &CompletedTasks) -> Option<StreakOutcome> {
        match serde_json::to_string(progress) {
            Ok(json) => self.write(&progress_key(day), &json),
            Err(e) => warn!("Failed to serialize progress for {day}: {e}"),
        }

        if !self.is_complete(progress) {
            return None;
        }
        Some(self.credit_day(day))
    }

    pub fn load_stats(&self) -> Stats {
        let Some(stats) = self.read_json::<Stats>(STATS_KEY) else {
            return Stats::default();
        };
        if stats.best_streak < stats.current_streak {
            warn!(
                streak = stats.current_streak,
                best = stats.best_streak,
                "Ignoring inconsistent {STATS_KEY}"
            );
            return Stats::default();
        }
        stats
    }

    /// The most recent day credited as fully complete, if any.
    pub fn last_completed_date(&self) -> Option<DateKey> {
        let raw = self.read(LAST_COMPLETED_KEY)?;
        match raw.parse() {
            Ok(day) => Some(day),
            Err(e) => {
                warn!("Ignoring malformed {LAST_COMPLETED_KEY}: {e}");
                None
            }
        }
    }

    pub fn reset_today(&mut self) {
        self.reset_day(self.today_key());
    }

    /// Delete the completion map of `day`. Stats and the last credited day
    /// are left untouched: a reset does not take back a streak already
    /// earned.
    pub fn reset_day(&mut self, day: DateKey) {
        if let Err(e) = self.store.remove(&progress_key(day)) {
            warn!("Failed to delete progress for {day}: {e}");
        }
        info!(%day, "Routine progress reset");
    }

    fn is_complete(&self, progress: &CompletedTasks) -> bool {
        self.required.iter().all(|id| progress.is_completed(*id))
    }

    fn credit_day(&mut self, day: DateKey) -> StreakOutcome {
        let outcome = streak::evaluate(self.load_stats(), self.last_completed_date(), day);
        match outcome.stats() {
            None => debug!(%day, "Day already credited"),
            Some(stats) => {
                match serde_json::to_string(&stats) {
                    Ok(json) => self.write(STATS_KEY, &json),
                    Err(e) => warn!("Failed to serialize stats: {e}"),
                }
                self.write(LAST_COMPLETED_KEY, &day.to_string());
                info!(
                    %day,
                    streak = stats.current_streak,
                    best = stats.best_streak,
                    days = stats.completed_days,
                    "Routine completed"
                );
            }
        }
        outcome
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Storage read of '{key}' failed, using default: {e}");
                None
            }
        }
    }

    /// Every stored JSON value is an object; serde would otherwise accept a
    /// positional array for a struct.
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        let parsed = serde_json::from_str::<Value>(&raw).and_then(|value| {
            if value.is_object() {
                serde_json::from_value(value)
            } else {
                Err(de::Error::invalid_type(unexpected(&value), &"a JSON object"))
            }
        });
        match parsed {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed value under '{key}': {e}");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!("Storage write of '{key}' failed: {e}");
        }
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

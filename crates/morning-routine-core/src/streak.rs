//! Streak bookkeeping for fully completed days.
//!
//! [`evaluate`] is pure: it takes the prior stats, the last credited day
//! and today's key, and says what (if anything) changes. Persisting the
//! outcome is the storage adapter's job.

use serde::{Deserialize, Serialize};

use crate::clock::DateKey;

/// Aggregate streak statistics.
///
/// Stored as `{"streak":n,"bestStreak":n,"completedDays":n}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(rename = "streak", default)]
    pub current_streak: u32,
    #[serde(default)]
    pub best_streak: u32,
    #[serde(default)]
    pub completed_days: u32,
}

/// What crediting a fully completed day did to the stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// Today was already credited; nothing changes.
    AlreadyCredited,
    /// Yesterday was credited, so the streak grew.
    Continued(Stats),
    /// First completion ever, or the streak was broken by a gap.
    Restarted(Stats),
}

impl StreakOutcome {
    /// The stats to persist, if any.
    pub fn stats(&self) -> Option<Stats> {
        match self {
            StreakOutcome::AlreadyCredited => None,
            StreakOutcome::Continued(s) | StreakOutcome::Restarted(s) => Some(*s),
        }
    }
}

/// Credit `today` as a fully completed day.
pub fn evaluate(prior: Stats, last_completed: Option<DateKey>, today: DateKey) -> StreakOutcome {
    if last_completed == Some(today) {
        return StreakOutcome::AlreadyCredited;
    }

    let mut next = prior;
    next.completed_days = next.completed_days.saturating_add(1);

    let continued = last_completed == Some(today.yesterday());
    next.current_streak = if continued {
        next.current_streak.saturating_add(1)
    } else {
        1
    };
    next.best_streak = next.best_streak.max(next.current_streak);

    if continued {
        StreakOutcome::Continued(next)
    } else {
        StreakOutcome::Restarted(next)
    }
}

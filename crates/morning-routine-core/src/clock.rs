//! Calendar dates and the clock that supplies them.
//!
//! All day-boundary logic goes through [`Clock::today`] so tests can pin
//! the date instead of depending on wall-clock time.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar date serialized as `YYYY-MM-DD`, used as a storage partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Build a key from year/month/day, `None` if the date does not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The previous calendar day. Pure date arithmetic, no time zone involved.
    pub fn yesterday(&self) -> Self {
        Self(self.0.pred_opt().unwrap_or(NaiveDate::MIN))
    }

    pub fn tomorrow(&self) -> Self {
        Self(self.0.succ_opt().unwrap_or(NaiveDate::MAX))
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDateKey(s.to_string()))
    }
}

impl TryFrom<String> for DateKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_string()
    }
}

/// Supplies "today" to the rest of the crate.
pub trait Clock: Send + Sync + 'static {
    fn today(&self) -> DateKey;
}

/// Local calendar date from the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DateKey {
        DateKey(Local::now().date_naive())
    }
}

/// A clock that returns whatever date it was last set to.
///
/// Clones share the same date, so a test can keep one handle and advance
/// the day under a controller that owns another.
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<Mutex<DateKey>>,
}

impl FixedClock {
    pub fn new(date: DateKey) -> Self {
        Self {
            date: Arc::new(Mutex::new(date)),
        }
    }

    pub fn set(&self, date: DateKey) {
        *self.date.lock().unwrap_or_else(|e| e.into_inner()) = date;
    }

    /// Move the clock forward by `days` calendar days.
    pub fn advance_days(&self, days: u32) {
        let mut guard = self.date.lock().unwrap_or_else(|e| e.into_inner());
        for _ in 0..days {
            *guard = guard.tomorrow();
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DateKey {
        *self.date.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Captures another clock's date once and keeps returning it.
///
/// Used when the day boundary is frozen at session start.
#[derive(Debug, Clone, Copy)]
pub struct FrozenClock {
    date: DateKey,
}

impl FrozenClock {
    pub fn capture(clock: &dyn Clock) -> Self {
        Self {
            date: clock.today(),
        }
    }
}

impl Clock for FrozenClock {
    fn today(&self) -> DateKey {
        self.date
    }
}

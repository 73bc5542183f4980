//! # Morning Routine Core Library
//!
//! This library provides the state, timer and persistence logic behind the
//! Morning Routine daily checklist. Presentation layers (the bundled CLI, or
//! any other front-end) are thin shells over the same core.
//!
//! ## Architecture
//!
//! - **Routine**: the fixed catalogue of tasks, built once at start-up
//! - **Storage**: a key-value port ([`KeyValueStore`]) with SQLite and
//!   in-memory stores, and the [`ProgressStore`] adapter that keeps today's
//!   completion map and the streak statistics
//! - **Streak**: a pure evaluator deciding how a fully completed day moves
//!   the streak counters
//! - **Timer**: a single-countdown state machine driven by one-second ticks,
//!   plus the cancellable [`Ticker`] that produces those ticks
//! - **Controller / Session**: the [`RoutineController`] orchestrates all of
//!   the above; the [`Session`] runs it on an event loop
//!
//! ## Key Components
//!
//! - [`RoutineController`]: toggle / start / reset operations and derived views
//! - [`TimerEngine`]: countdown state machine
//! - [`ProgressStore`]: date-keyed persistence that never fails the caller
//! - [`Config`]: application configuration management

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod routine;
pub mod session;
pub mod storage;
pub mod streak;
pub mod timer;

pub use clock::{Clock, DateKey, FixedClock, FrozenClock, SystemClock};
pub use config::{Config, DayBoundary, StorageBackend};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use routine::{
    CompletedTasks, Routine, RoutineController, RoutineTask, TaskCategory, TaskId,
};
pub use session::{Session, SessionCommand, SessionHandle};
pub use storage::{KeyValueStore, MemoryStore, ProgressStore, SqliteStore, Stats};
pub use timer::{Ticker, TimerEngine, TimerState};

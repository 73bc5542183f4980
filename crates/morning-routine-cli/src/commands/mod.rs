pub mod config;
pub mod list;
pub mod reset;
pub mod stats;
pub mod timer;
pub mod toggle;

use std::sync::Arc;

use morning_routine_core::{
    Clock, Config, DayBoundary, FrozenClock, KeyValueStore, MemoryStore, Routine,
    RoutineController, SqliteStore, StorageBackend, SystemClock, TaskId, ValidationError,
};
use tracing::warn;

pub type Controller = RoutineController<Box<dyn KeyValueStore>>;

/// Build a controller over the configured store and clock.
///
/// A store that cannot be opened degrades to an in-memory one so the
/// routine still works, just without persistence.
pub fn open_controller(config: &Config) -> Controller {
    let store: Box<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Sqlite => match SqliteStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!("Falling back to in-memory storage: {e}");
                Box::new(MemoryStore::new())
            }
        },
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    };

    let clock: Arc<dyn Clock> = match config.day.boundary {
        DayBoundary::Live => Arc::new(SystemClock),
        DayBoundary::Frozen => Arc::new(FrozenClock::capture(&SystemClock)),
    };

    RoutineController::new(Routine::morning(), store, clock)
}

/// The core ignores unknown ids; on the command line they are a usage error.
pub fn ensure_task(controller: &Controller, id: TaskId) -> Result<(), Box<dyn std::error::Error>> {
    if controller.routine().contains(id) {
        Ok(())
    } else {
        Err(ValidationError::UnknownTask(id).into())
    }
}

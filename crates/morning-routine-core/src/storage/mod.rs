mod database;
mod memory;
pub mod progress;

pub use crate::streak::Stats;
pub use database::SqliteStore;
pub use memory::MemoryStore;
pub use progress::ProgressStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// String-valued key-value storage port.
///
/// The progress adapter is the only component that reads or writes
/// through this trait; everything else goes through the adapter.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `MORNING_ROUTINE_HOME` overrides the location entirely. Otherwise
/// `~/.config/morning-routine[-dev]/` is used, the `-dev` suffix when
/// `MORNING_ROUTINE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("MORNING_ROUTINE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("MORNING_ROUTINE_ENV")
                .unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("morning-routine-dev")
            } else {
                base_dir.join("morning-routine")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

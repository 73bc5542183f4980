use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::task::{Routine, TaskId};

/// Today's completion map: task id to `true`. Absence means not completed.
///
/// Serializes as a JSON object keyed by the numeric id string,
/// e.g. `{"1":true,"4":true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletedTasks(BTreeMap<TaskId, bool>);

impl CompletedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, id: TaskId) -> bool {
        self.0.get(&id).copied().unwrap_or(false)
    }

    /// Flip membership of `id`. Returns the new completion state.
    pub fn toggle(&mut self, id: TaskId) -> bool {
        if self.0.remove(&id).is_some() {
            false
        } else {
            self.0.insert(id, true);
            true
        }
    }

    /// Mark `id` as completed. Returns `false` if it already was.
    pub fn mark(&mut self, id: TaskId) -> bool {
        self.0.insert(id, true) != Some(true)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Count of entries marked `true`.
    pub fn count(&self) -> usize {
        self.0.values().filter(|done| **done).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// `true` when every task of `routine` is marked done.
    pub fn covers(&self, routine: &Routine) -> bool {
        routine.ids().all(|id| self.is_completed(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.0.iter().filter(|(_, done)| **done).map(|(id, _)| *id)
    }
}

impl FromIterator<TaskId> for CompletedTasks {
    fn from_iter<I: IntoIterator<Item = TaskId>>(iter: I) -> Self {
        Self(iter.into_iter().map(|id| (id, true)).collect())
    }
}

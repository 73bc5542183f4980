use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub type TaskId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Wellness,
    Fitness,
    Mindfulness,
}

impl TaskCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::Wellness => "wellness",
            TaskCategory::Fitness => "fitness",
            TaskCategory::Mindfulness => "mindfulness",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineTask {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    /// Duration in minutes. May be fractional.
    pub duration_min: f64,
    pub category: TaskCategory,
}

impl RoutineTask {
    fn new(
        id: TaskId,
        name: &str,
        description: &str,
        duration_min: f64,
        category: TaskCategory,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            duration_min,
            category,
        }
    }

    /// Countdown length in whole seconds, never less than one.
    pub fn duration_secs(&self) -> u64 {
        minutes_to_secs(self.duration_min)
    }
}

/// Convert a real-valued minute count to countdown seconds.
///
/// Rounds to the nearest second and clamps to at least one so a running
/// countdown always has something left to tick.
pub fn minutes_to_secs(minutes: f64) -> u64 {
    if !minutes.is_finite() || minutes <= 0.0 {
        return 1;
    }
    ((minutes * 60.0).round() as u64).max(1)
}

/// The fixed, ordered list of tasks presented each day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routine {
    tasks: Vec<RoutineTask>,
}

impl Routine {
    /// The built-in morning routine.
    pub fn morning() -> Self {
        use TaskCategory::*;
        Self {
            tasks: vec![
                RoutineTask::new(
                    1,
                    "Hydrate",
                    "Drink a full glass of water before anything else",
                    1.0,
                    Wellness,
                ),
                RoutineTask::new(
                    2,
                    "Morning Stretch",
                    "Loosen up neck, shoulders, hips and hamstrings",
                    5.0,
                    Fitness,
                ),
                RoutineTask::new(
                    3,
                    "Box Breathing",
                    "Inhale, hold, exhale, hold -- four counts each",
                    3.0,
                    Mindfulness,
                ),
                RoutineTask::new(
                    4,
                    "Bodyweight Circuit",
                    "Push-ups, squats and a plank, at an easy pace",
                    10.0,
                    Fitness,
                ),
                RoutineTask::new(
                    5,
                    "Gratitude Journal",
                    "Write down three things you are grateful for",
                    5.0,
                    Mindfulness,
                ),
                RoutineTask::new(
                    6,
                    "Make the Bed",
                    "Start the day with one finished task",
                    2.0,
                    Wellness,
                ),
                RoutineTask::new(
                    7,
                    "Meditation",
                    "Sit quietly and follow the breath",
                    10.0,
                    Mindfulness,
                ),
            ],
        }
    }

    /// Build a routine from an explicit task list.
    ///
    /// # Errors
    /// Returns an error if two tasks share an id or a duration is not positive.
    pub fn from_tasks(tasks: Vec<RoutineTask>) -> Result<Self, ValidationError> {
        for (i, task) in tasks.iter().enumerate() {
            if tasks[..i].iter().any(|t| t.id == task.id) {
                return Err(ValidationError::InvalidValue {
                    field: "id".into(),
                    message: format!("duplicate task id {}", task.id),
                });
            }
            if !(task.duration_min.is_finite() && task.duration_min > 0.0) {
                return Err(ValidationError::InvalidValue {
                    field: "duration_min".into(),
                    message: format!("task {} must have a positive duration", task.id),
                });
            }
        }
        Ok(Self { tasks })
    }

    pub fn tasks(&self) -> &[RoutineTask] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&RoutineTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.iter().map(|t| t.id)
    }

    /// Sum of all task durations in minutes.
    pub fn total_duration_min(&self) -> f64 {
        self.tasks.iter().map(|t| t.duration_min).sum()
    }
}

impl Default for Routine {
    fn default() -> Self {
        Self::morning()
    }
}

mod completed;
mod controller;
mod task;

pub use completed::CompletedTasks;
pub use controller::RoutineController;
pub use task::{minutes_to_secs, Routine, RoutineTask, TaskCategory, TaskId};

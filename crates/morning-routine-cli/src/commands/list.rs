use morning_routine_core::{Config, DateKey, Stats, TaskCategory, TaskId};
use serde::Serialize;

use super::{open_controller, Controller};

#[derive(Serialize)]
struct TaskView<'a> {
    id: TaskId,
    name: &'a str,
    description: &'a str,
    duration_min: f64,
    category: TaskCategory,
    completed: bool,
}

#[derive(Serialize)]
struct RoutineView<'a> {
    day: DateKey,
    tasks: Vec<TaskView<'a>>,
    total_completed: usize,
    total_tasks: usize,
    total_duration_min: f64,
    progress_pct: f64,
    fully_complete: bool,
    stats: Stats,
}

fn view(controller: &Controller) -> RoutineView<'_> {
    let tasks = controller
        .routine()
        .tasks()
        .iter()
        .map(|t| TaskView {
            id: t.id,
            name: &t.name,
            description: &t.description,
            duration_min: t.duration_min,
            category: t.category,
            completed: controller.is_completed(t.id),
        })
        .collect();
    RoutineView {
        day: controller.day(),
        tasks,
        total_completed: controller.total_completed(),
        total_tasks: controller.total_tasks(),
        total_duration_min: controller.routine().total_duration_min(),
        progress_pct: controller.progress_percentage(),
        fully_complete: controller.is_fully_complete(),
        stats: controller.stats(),
    }
}

pub fn run(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let controller = open_controller(config);
    let view = view(&controller);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "Morning Routine {}  ({}/{}, {:.0}%)",
        view.day, view.total_completed, view.total_tasks, view.progress_pct
    );
    for task in &view.tasks {
        let mark = if task.completed { "x" } else { " " };
        println!(
            "[{mark}] {:>2}  {:<20} {:>5} min  {}",
            task.id,
            task.name,
            format_minutes(task.duration_min),
            task.category.label()
        );
    }
    println!("{:>32} min total", format_minutes(view.total_duration_min));
    if view.fully_complete {
        println!("All done for today!");
    }
    println!(
        "Streak: {} day(s), best {}, {} day(s) completed",
        view.stats.current_streak, view.stats.best_streak, view.stats.completed_days
    );
    Ok(())
}

fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{minutes:.0}")
    } else {
        format!("{minutes:.1}")
    }
}

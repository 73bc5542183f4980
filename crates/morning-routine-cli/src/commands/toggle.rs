use morning_routine_core::{Config, Event, TaskId};

use super::{ensure_task, open_controller};

pub fn run(config: &Config, id: TaskId) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = open_controller(config);
    ensure_task(&controller, id)?;

    for event in controller.toggle_task(id) {
        if let Event::StreakCredited { stats, .. } = event {
            eprintln!(
                "Routine complete! Streak: {} day(s), best {}",
                stats.current_streak, stats.best_streak
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    Ok(())
}

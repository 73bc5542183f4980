use morning_routine_core::{Config, Event, Session, SessionHandle, TaskId};

use super::{ensure_task, open_controller};

pub fn run(config: &Config, id: TaskId) -> Result<(), Box<dyn std::error::Error>> {
    let controller = open_controller(config);
    ensure_task(&controller, id)?;
    let name = controller
        .routine()
        .get(id)
        .map(|t| t.name.clone())
        .unwrap_or_default();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let session = Session::with_tick_period(controller, config.tick_period());
        let (mut handle, join) = session.spawn();
        handle.start_timer(id).await;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    handle.reset_timer().await;
                    eprintln!();
                    eprintln!("{name}: timer cancelled");
                    break;
                }
                event = handle.next_event() => match event {
                    Some(Event::TimerStarted { duration_secs, .. }) => {
                        eprint!("{name}: {}", format_remaining(duration_secs));
                    }
                    Some(Event::TimerTicked { remaining_secs, .. }) => {
                        eprint!("\r{name}: {}", format_remaining(remaining_secs));
                    }
                    Some(Event::TimerCompleted { .. }) => {
                        eprintln!("\r{name}: done ");
                        report(&mut handle);
                        break;
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }

        handle.shutdown().await;
        let controller = join.await?;
        println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Print whatever the completion produced alongside it.
fn report(handle: &mut SessionHandle) {
    for event in handle.drain_events() {
        if let Event::StreakCredited { stats, .. } = event {
            eprintln!(
                "Routine complete! Streak: {} day(s), best {}",
                stats.current_streak, stats.best_streak
            );
        }
    }
}

fn format_remaining(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

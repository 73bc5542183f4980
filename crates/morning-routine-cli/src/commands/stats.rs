use morning_routine_core::{Config, DateKey, Stats};
use serde::Serialize;

use super::open_controller;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    #[serde(flatten)]
    stats: Stats,
    last_completed_date: Option<DateKey>,
}

pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let controller = open_controller(config);
    let report = StatsReport {
        stats: controller.stats(),
        last_completed_date: controller.last_completed_date(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

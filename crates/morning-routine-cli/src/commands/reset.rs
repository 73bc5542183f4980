use morning_routine_core::Config;

use super::open_controller;

pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = open_controller(config);
    controller.reset_routine();
    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    Ok(())
}

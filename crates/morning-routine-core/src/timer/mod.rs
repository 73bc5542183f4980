mod engine;
mod ticker;

pub use engine::{TimerEngine, TimerState};
pub use ticker::Ticker;

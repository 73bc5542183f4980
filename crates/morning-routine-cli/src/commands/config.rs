use clap::{Subcommand, ValueEnum};
use morning_routine_core::Config;

/// Settable keys. clap rejects anything else before the config is touched.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    #[value(name = "log_level")]
    LogLevel,
    #[value(name = "timer.tick_interval_ms")]
    TickIntervalMs,
    #[value(name = "storage.backend")]
    StorageBackend,
    #[value(name = "day.boundary")]
    DayBoundary,
}

impl ConfigKey {
    fn path(self) -> &'static str {
        match self {
            ConfigKey::LogLevel => "log_level",
            ConfigKey::TickIntervalMs => "timer.tick_interval_ms",
            ConfigKey::StorageBackend => "storage.backend",
            ConfigKey::DayBoundary => "day.boundary",
        }
    }

    fn accepts(self) -> &'static str {
        match self {
            ConfigKey::LogLevel => "a tracing filter such as warn, info or morning_routine_core=debug",
            ConfigKey::TickIntervalMs => "a positive number of milliseconds",
            ConfigKey::StorageBackend => "sqlite or memory",
            ConfigKey::DayBoundary => "live or frozen",
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        #[arg(value_enum)]
        key: ConfigKey,
    },
    /// Set a config value
    Set {
        #[arg(value_enum)]
        key: ConfigKey,
        /// New value
        value: String,
    },
    /// List all config values
    List {
        /// Print the whole config as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", lookup(&config, key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            if let Err(e) = config.set(key.path(), &value) {
                return Err(format!("{e} ({} expects {})", key.path(), key.accepts()).into());
            }
            println!("{} = {}", key.path(), lookup(&config, key)?);
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for key in ConfigKey::value_variants() {
                    println!("{} = {}", key.path(), lookup(&config, *key)?);
                }
            }
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

fn lookup(config: &Config, key: ConfigKey) -> Result<String, String> {
    config
        .get(key.path())
        .ok_or_else(|| format!("{} is missing from the config", key.path()))
}

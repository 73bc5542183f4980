use clap::{Parser, Subcommand};
use morning_routine_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "morning-routine", version, about = "Morning Routine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's routine and progress
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task done, or undo it
    Toggle {
        /// Task ID
        id: u32,
    },
    /// Run a task's countdown in the foreground
    Timer {
        /// Task ID
        id: u32,
    },
    /// Clear today's progress
    Reset,
    /// Streak statistics
    Stats,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_logging(&config);

    let result = match cli.command {
        Commands::List { json } => commands::list::run(&config, json),
        Commands::Toggle { id } => commands::toggle::run(&config, id),
        Commands::Timer { id } => commands::timer::run(&config, id),
        Commands::Reset => commands::reset::run(&config),
        Commands::Stats => commands::stats::run(&config),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

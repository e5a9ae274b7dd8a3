use clap::{Parser, Subcommand};
use pomorun_core::{Config, DEFAULT_STATS_DAYS};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pomorun", version, about = "Pomorun CLI")]
struct Cli {
    /// Act as this user instead of the configured one
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Per-user timer settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Session log
    Sessions {
        #[command(subcommand)]
        action: commands::sessions::SessionsAction,
    },
    /// Focus statistics for the last N days
    Stats {
        #[arg(long, default_value_t = DEFAULT_STATS_DAYS, value_parser = clap::value_parser!(u32).range(1..=365))]
        days: u32,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr; stdout is reserved for JSON.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_env("POMORUN_LOG")
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> commands::CliResult {
    // Config commands must work even when config.toml is invalid.
    let command = match cli.command {
        Commands::Config { action } => {
            init_logging(&Config::default());
            return commands::config::run(action);
        }
        other => other,
    };

    let config = Config::load()?;
    init_logging(&config);

    let ctx = commands::Context::new(config, cli.user);
    match command {
        Commands::Timer { action } => commands::timer::run(action, &ctx),
        Commands::Settings { action } => commands::settings::run(action, &ctx),
        Commands::Sessions { action } => commands::sessions::run(action, &ctx),
        Commands::Stats { days } => commands::stats::run(days, &ctx),
        Commands::Config { action } => commands::config::run(action),
    }
}

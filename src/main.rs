//! Testforge CLI entry point.

use clap::Parser;

use testforge::cli::{handle_error, load_config, Cli, Commands};
use testforge::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A broken config must not prevent `init` from repairing it; the
    // commands load and report it themselves.
    let log_config = load_config(cli.config.as_deref())
        .map(|config| LogConfig::from(&config.logging))
        .unwrap_or_default();
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("warning: logging disabled: {err}");
            None
        }
    };

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Generate(args) => {
            testforge::cli::commands::generate::execute(args, config_path, cli.json).await
        }
        Commands::Init(args) => testforge::cli::commands::init::execute(args, cli.json).await,
        Commands::Config(args) => {
            testforge::cli::commands::config::execute(&args, config_path, cli.json)
        }
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}

use clap::Parser;
use segrouter::cli::{run_cli, Cli};
use segrouter::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // CLI output goes to stdout; default logs to warn so they stay out of the way
    let mut log_config = LogConfig::from_env();
    if std::env::var("SEGROUTER_LOG_LEVEL").is_err() {
        log_config.log_level = "warn".to_string();
    }
    init_logging_with_config(&log_config)?;

    run_cli(cli)
}

use clap::Parser;
use cronmail::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_and_merge_config(&cli).map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        e
    })?;

    let _logger = cli::init_logger_from_settings(&settings).map_err(|e| {
        eprintln!("Logger initialization error: {:#}", e);
        e
    })?;

    if let Err(e) = cli::execute_command(&cli, settings).await {
        tracing::error!(error = ?e, "Command failed");
        eprintln!("Error: {}", e);
        if matches!(e, cronmail::error::AppError::Validation { .. }) {
            eprintln!("{}", Cli::get_validation_help());
        }
        std::process::exit(1);
    }

    Ok(())
}

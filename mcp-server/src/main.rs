use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use mcp_server::config::Config;
use mcp_server::setup::{self, DEFAULT_DOTENV_DIR};
use mcp_server::telemetry::{init_telemetry, log_config_validation, log_startup_info};

#[derive(Parser)]
#[command(name = "ticktick-mcp")]
#[command(about = "TickTick MCP server (stdio transport)")]
#[command(version)]
struct Cli {
    /// Directory containing the .env file with TickTick credentials
    #[arg(long, env = "TICKTICK_DOTENV_DIR", default_value = DEFAULT_DOTENV_DIR)]
    dotenv_dir: String,

    /// Configuration file path
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<String>,

    /// Log level override
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(config_file) => Config::from_file(config_file)?,
        None => Config::from_env()?,
    };

    if let Some(ref log_level) = cli.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Locate and load the .env file before anything reads the environment
    let dotenv_dir = setup::resolve_dotenv_dir(&cli.dotenv_dir)
        .context("Failed to prepare the dotenv directory")?;
    setup::load_env_file(&dotenv_dir)?;

    // Load configuration
    let config = load_config(&cli).context("Failed to load configuration")?;

    // Initialize telemetry/logging (stderr only; stdout is the protocol)
    init_telemetry(&config.logging).context("Failed to initialize telemetry")?;

    log_config_validation(&config);
    if let Err(e) = config.validate() {
        error!(error = %e, "Configuration validation failed");
        std::process::exit(1);
    }

    log_startup_info(&config);

    // Initialize the TickTick client; this may run the interactive OAuth
    // flow on first use
    info!("Initializing TickTick MCP server components");
    let server = setup::initialize_app(&config, &dotenv_dir)
        .await
        .context("Failed to initialize application")?;

    // Setup graceful shutdown handling
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                return;
            }
        };
        let mut sigint = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()) {
            Ok(signal) => signal,
            Err(e) => {
                error!(error = %e, "Failed to register SIGINT handler");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, initiating graceful shutdown");
            }
        }

        let _ = shutdown_tx.send(());
    });

    // Run the stdio transport until stdin closes or a signal arrives
    info!("TickTick client ready. Starting MCP server on stdio");
    tokio::select! {
        result = server.serve() => {
            match result {
                Ok(_) => {
                    info!("MCP server shut down cleanly");
                    Ok(())
                }
                Err(e) => {
                    error!(error = %e, "MCP server error");
                    std::process::exit(1);
                }
            }
        }
        _ = shutdown_rx => {
            info!("Shutdown signal received, stopping server");
            Ok(())
        }
    }
}

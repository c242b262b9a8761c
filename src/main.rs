//! ibot - Terminal client for a RAG chat service
//!
//! Main entry point: parses the CLI, loads and validates configuration,
//! and dispatches to the command handlers.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ibot::cli::{Cli, Commands};
use ibot::commands;
use ibot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat {
            knowledge_base,
            top_k,
        } => {
            tracing::info!("Starting interactive chat session");
            if let Some(id) = knowledge_base {
                tracing::debug!("Using knowledge base override: {}", id);
            }
            if let Some(k) = top_k {
                tracing::debug!("Using top_k override: {}", k);
            }

            // Overrides were already merged into `config` during load
            commands::chat::run_chat(config).await?;
            Ok(())
        }
        Commands::Ask {
            query,
            knowledge_base,
            top_k,
        } => {
            tracing::info!("Asking a single question");
            if let Some(id) = knowledge_base {
                tracing::debug!("Using knowledge base override: {}", id);
            }
            if let Some(k) = top_k {
                tracing::debug!("Using top_k override: {}", k);
            }

            commands::ask::run_ask(config, query).await?;
            Ok(())
        }
        Commands::Kb { command } => {
            tracing::info!("Starting knowledge base command");
            commands::kb::run_kb(config, command).await?;
            Ok(())
        }
        Commands::Doc { command } => {
            tracing::info!("Starting document command");
            commands::doc::run_doc(config, command).await?;
            Ok(())
        }
        Commands::Report { command } => {
            tracing::info!("Starting report command");
            commands::report::run_report(config, command).await?;
            Ok(())
        }
        Commands::Carbon { command } => {
            tracing::info!("Starting carbon data command");
            commands::carbon::run_carbon(config, command).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "ibot=debug" } else { "ibot=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// nova-bridge - agent-facing bridge between Blender and the Nova editor
// Main entry point

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nova_bridge::config::load_config;
use nova_bridge::server::BridgeServer;
use nova_bridge::tools::build_registry;

#[derive(Parser)]
#[command(name = "nova-bridge", version, about = "Blender-to-Nova content bridge")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server exposing the tool catalog
    Serve {
        /// Bind address, e.g. 127.0.0.1:30012 (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the tool catalog as JSON
    ListTools,
    /// Invoke a single tool and print the result envelope
    Invoke {
        /// Tool name, e.g. blender_export
        name: String,
        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = load_config()?;

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            let server_config = config.server.clone();
            let registry = build_registry(Arc::new(config))?;
            BridgeServer::new(server_config, registry).serve().await
        }
        Command::ListTools => {
            let registry = build_registry(Arc::new(config))?;
            let catalog = serde_json::to_string_pretty(&registry.definitions())?;
            println!("{}", catalog);
            Ok(())
        }
        Command::Invoke { name, params } => {
            let params: serde_json::Value =
                serde_json::from_str(&params).context("--params must be a JSON object")?;
            let registry = build_registry(Arc::new(config))?;
            let result = registry.invoke(&name, params).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.is_error {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

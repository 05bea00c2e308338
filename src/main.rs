use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;

use alcove::api::{self, AppState};
use alcove::config::Config;
use alcove::storage::{Database, DatabaseError};

#[derive(Parser, Debug)]
#[command(name = "alcove", about = "Read-it-later article vault server")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, value_name = "FILE", default_value = "alcove.toml")]
    config: PathBuf,

    /// Override the listen address from the config
    #[arg(long)]
    listen: Option<String>,

    /// Override the database path from the config
    #[arg(long, value_name = "FILE")]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config).context("Failed to load configuration")?;
    let listen = args.listen.unwrap_or_else(|| config.listen.clone());
    let db_path = args.db.unwrap_or_else(|| config.database_path.clone());

    let Some(api_key) = config.resolve_api_key() else {
        eprintln!("Error: no API key configured.");
        eprintln!();
        eprintln!("Set the ALCOVE_API_KEY environment variable, or add");
        eprintln!("  api_key = \"...\"");
        eprintln!("to {}.", args.config.display());
        std::process::exit(1);
    };

    let db = match Database::open(&db_path).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: another instance of alcove appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };
    info!(path = %db_path, "Database ready");

    let client = reqwest::Client::new();
    let state = AppState::new(db, client, api_key);
    let app = api::router(state);

    let listener = TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!("HTTP server listening on {}", listen);
    axum::serve(listener, app).await?;

    Ok(())
}

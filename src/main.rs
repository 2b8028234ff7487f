//! taskdeck server binary.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskdeck::config::Cli;
use taskdeck::db::Database;
use taskdeck::generator::ChatGenerator;
use taskdeck::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let db = Database::open(&cli.db)?;
    info!(db = %cli.db.display(), "database ready");

    let generator = ChatGenerator::new(cli.generator_config())?;
    if cli.generator_api_key.is_none() {
        info!("no generator API key configured; breakdown requests will fail upstream");
    } else {
        info!(model = generator.model(), "generator configured");
    }

    let state = AppState::new(db, Arc::new(generator));
    server::serve(state, cli.addr).await
}

//! pmsync - Polymarket trading-state sync client - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Polymarket trading-state sync client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PMSYNC_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    pmsync_ws::init_crypto();

    let args = Args::parse();

    pmsync_telemetry::init_logging()?;

    info!("Starting pmsync v{}", env!("CARGO_PKG_VERSION"));

    let config = pmsync_bot::AppConfig::load(args.config.as_deref())?;
    info!(
        market_url = %config.websocket.market_url,
        user_url = %config.websocket.user_url,
        tokens = config.markets.tokens.len(),
        "Configuration loaded"
    );

    let app = pmsync_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}

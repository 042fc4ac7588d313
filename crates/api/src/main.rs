//! ThermaSafe - Main Entry Point

use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_logging(&settings.logging)?;

    info!("=== ThermaSafe v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting cookware heat monitor...");

    run_server(settings).await
}

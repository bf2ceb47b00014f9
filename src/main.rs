use anyhow::Result;
use tracing::info;

use linkwatch::app::App;
use linkwatch::config::AppConfig;
use linkwatch::db;

#[tokio::main]
async fn main() -> Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting linkwatch connectivity core...");

    // Init DB
    let pool = db::init_pool(&config.database_url).await?;
    info!("Connected to database");

    let _app = App::new(&config, pool);

    // The HTTP transport mounts the App services; this host keeps the
    // process alive until it is told to stop.
    info!("Service wiring ready; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}

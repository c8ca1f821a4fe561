//! Tessera server entry point.

use tessera_content::{ChannelEmitter, TracingSink};
use tessera_db::DbManager;
use tessera_server::{ServerConfig, Services};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tessera=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting Tessera server...");

    let config = ServerConfig::from_env();
    let db = DbManager::connect(&config.db).await?;
    tessera_db::run_migrations(db.client()).await?;

    let (events, event_worker) = ChannelEmitter::spawn(TracingSink, config.content.event_buffer);
    let services = Services::new(db.client(), events, &config.content);

    tracing::info!("Content services ready");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    // Dropping the services closes the event queue; the worker drains it.
    drop(services);
    event_worker.await?;

    tracing::info!("Tessera server stopped.");
    Ok(())
}

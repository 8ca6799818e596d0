//! # Roost Core Service
//!
//! Application entry point:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database pool, cache tiers, hub
//! - HTTP/WebSocket listener with graceful shutdown

use anyhow::Result;
use tracing::info;

use roost::config::Settings;
use roost::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    roost::telemetry::init_tracing();

    info!("starting roost core service");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        realm_id = %settings.realm_id,
        "configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}

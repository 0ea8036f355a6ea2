use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use charak::api::server::start_server;
use charak::api::types::ApiContext;
use charak::config::{self, Config};
use charak::db;
use charak::notify::HttpNotifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env("CHARAK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Arc::new(Config::from_env());
    tracing::info!(
        version = config::APP_VERSION,
        addr = %config.bind_addr,
        db = %config.db_path.display(),
        "starting {}",
        config::APP_NAME
    );

    if let Some(dir) = config.db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    // Open once at startup so migrations run before the first request.
    db::open_database(&config.db_path)?;

    let notifier = Arc::new(HttpNotifier::from_config(&config));
    let ctx = ApiContext::new(config.clone(), config.db_path.clone(), notifier);

    let mut server = start_server(ctx).await?;
    tracing::info!(addr = %server.addr, "listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.shutdown();
    server.wait().await;
    Ok(())
}

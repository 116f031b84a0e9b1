//! Server binary: loads configuration from the environment, opens the
//! database, and serves the REST API until shutdown.

use tracing::info;
use tracing_subscriber::EnvFilter;

use taskforge_store::Database;

use taskforge_server::api::{self, AppState};
use taskforge_server::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (respects RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,taskforge_server=debug")),
        )
        .init();

    info!("Starting taskforge server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    let db = Database::open_at(&config.db_path)?;
    let app_state = AppState::new(db);

    // Periodic session cleanup (every hour).
    let sessions_db = app_state.db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let purged = sessions_db
                .lock()
                .ok()
                .and_then(|db| db.purge_expired_sessions().ok());
            if let Some(n) = purged {
                if n > 0 {
                    info!(purged = n, "removed expired sessions");
                }
            }
        }
    });

    // Run the HTTP API server until shutdown.
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

//! # fitstage-server
//!
//! Backend service for the FitStage fitness-competition platform core:
//! - **Voting & quota service**: vote casting with per-category spectator
//!   quotas, role gating (competitors may not vote), and derived leaderboards
//! - **Engagement aggregation**: like/comment/share counters with one-shot
//!   like dedup and trending/latest feed ordering
//! - **REST API** (axum) with per-IP rate limiting and a token-guarded
//!   admin surface for category management

mod api;
mod config;
mod error;
mod rate_limit;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fitstage_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fitstage_server=debug")),
        )
        .init();

    info!("Starting FitStage server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        http_addr = %config.http_addr,
        admin_enabled = config.admin_token.is_some(),
        default_max_votes = config.default_max_votes,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Open the store (runs migrations)
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };

    let rate_limiter = RateLimiter::default();

    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config.clone()),
        started_at: Instant::now(),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    let http_addr = config.http_addr;
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
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

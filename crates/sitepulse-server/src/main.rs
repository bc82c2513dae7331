use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use sitepulse_core::analytics::AnalyticsStore;
use sitepulse_server::{config::Config, ga4::Ga4Client, state::AppState};

/// `sitepulse health`: liveness check for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$SITEPULSE_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("SITEPULSE_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sitepulse=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/sitepulse.db", cfg.data_dir);
    let db = sitepulse_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;
    let store: Arc<dyn AnalyticsStore> = Arc::new(db);

    if cfg.ga4_property_id.is_none() {
        warn!("GA4_PROPERTY_ID not set. Analytics routes will answer 400 until it is configured.");
    }

    let mut state = AppState::new(Arc::clone(&store), cfg.clone());
    match Ga4Client::from_config(&cfg) {
        Ok(Some(client)) => {
            info!("GA4 client ready");
            state = state.with_fetcher(Arc::new(client));
        }
        Ok(None) => warn!("GA4_SERVICE_ACCOUNT_KEY not set. Sync is disabled."),
        Err(e) => error!(error = %e, "GA4 credentials unusable. Sync is disabled."),
    }
    let state = Arc::new(state);

    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            state.run_cache_purge_loop().await;
        });
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = sitepulse_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, cache = ?cfg.cache_mode, "SitePulse listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("SitePulse shut down");
    Ok(())
}

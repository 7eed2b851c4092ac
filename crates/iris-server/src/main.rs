use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use iris_server::state::AppState;

/// `iris health` — liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$IRIS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("IRIS_PORT").unwrap_or_else(|_| "8080".to_string());
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
                .add_directive("iris=info".parse()?),
        )
        .json()
        .init();

    let cfg = iris_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Creates the data directory and the events table if missing.
    let db = iris_duckdb::DuckDbBackend::open(&cfg.db_path(), &cfg.duckdb_memory_limit)?
        .with_query_timeout(cfg.query_timeout());

    let state = Arc::new(AppState::new(db, cfg.clone()));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = iris_server::app::build_app(Arc::clone(&state));

    info!(
        port = cfg.port,
        max_property_len = cfg.max_property_len,
        query_timeout_ms = cfg.query_timeout_ms,
        "Iris listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    if let Err(e) = state.repo.close().await {
        tracing::error!(error = %e, "Failed to close DuckDB");
    }

    Ok(())
}

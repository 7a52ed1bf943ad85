//! Deal Signal Engine — Binary Entrypoint
//! Boots the Axum HTTP server that serves dashboard aggregates, wiring routes,
//! shared config state and the Prometheus exporter.

use deal_signal_engine::metrics::Metrics;
use deal_signal_engine::{create_router, AppState, EngineConfig};
use shuttle_axum::ShuttleAxum;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; filter from `RUST_LOG` or a sane default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("deal_signal_engine=info,warn"));

    // try_init: Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables ENGINE_CONFIG_PATH from .env.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = EngineConfig::load_default();
    let metrics = Metrics::init(cfg.stages.names.len()).map_err(shuttle_runtime::Error::Custom)?;
    let state = AppState::new(cfg);

    let router = create_router(state).merge(metrics.router());
    info!("deal signal engine router ready");

    Ok(router.into())
}

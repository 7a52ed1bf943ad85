use std::sync::{Arc, RwLock};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::deal::DealRecord;
use crate::engine::{Dashboard, Engine};
use crate::select::DealSummary;
use crate::signal::Signal;

#[derive(Clone)]
pub struct AppState {
    config: Arc<RwLock<EngineConfig>>,
}

impl AppState {
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(cfg)),
        }
    }

    /// State backed by `$ENGINE_CONFIG_PATH` / `config/engine.toml` / defaults.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::load_default())
    }

    /// Snapshot engine for one request.
    fn engine(&self) -> Engine {
        let cfg = match self.config.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        Engine::new(cfg)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/dashboard", post(dashboard))
        .route("/aggregate/{name}", post(aggregate_one))
        .route("/deals/summary", post(deal_summaries))
        .route("/signals/normalize", post(normalize))
        .route("/config", get(current_config))
        .route("/admin/reload-config", post(admin_reload_config))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn to_json<T: Serialize>(v: T) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(v)
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn dashboard(
    State(state): State<AppState>,
    Json(deals): Json<Vec<DealRecord>>,
) -> Json<Dashboard> {
    debug!(target: "api", deals = deals.len(), "dashboard request");
    Json(state.engine().dashboard(&deals))
}

async fn aggregate_one(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(deals): Json<Vec<DealRecord>>,
) -> Result<Json<Value>, ApiError> {
    let engine = state.engine();
    match name.as_str() {
        "resolution" => to_json(engine.aggregate_resolution_status(&deals)),
        "upsell" => to_json(engine.aggregate_upsell_opportunities(&deals)),
        "priority" => to_json(engine.aggregate_priority_actions(&deals)),
        "objections" => to_json(engine.aggregate_objection_types(&deals)),
        "confidence" => to_json(engine.aggregate_confidence(&deals)),
        "verbs" => to_json(engine.aggregate_action_verbs(&deals)),
        "timeline" => to_json(engine.aggregate_deal_stage_timeline(&deals)),
        "signal-types" => to_json(engine.aggregate_signal_types(&deals)),
        "stage-amounts" => to_json(engine.aggregate_stage_amounts(&deals)),
        "owners" => to_json(engine.aggregate_amount_by_owner(&deals)),
        "outcomes" => to_json(engine.aggregate_action_outcomes(&deals)),
        other => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("unknown aggregate '{other}'"),
        )),
    }
}

async fn deal_summaries(
    State(state): State<AppState>,
    Json(deals): Json<Vec<DealRecord>>,
) -> Json<Vec<DealSummary>> {
    Json(state.engine().summarize_deals(&deals))
}

/// Accepts any JSON: a payload object/array, or a JSON-encoded string.
async fn normalize(State(state): State<AppState>, Json(raw): Json<Value>) -> Json<Vec<Signal>> {
    Json(state.engine().normalize_signals(&raw))
}

async fn current_config(State(state): State<AppState>) -> Json<EngineConfig> {
    Json(state.engine().config().clone())
}

async fn admin_reload_config(State(state): State<AppState>) -> Result<String, ApiError> {
    let path = EngineConfig::config_path();
    let fresh = EngineConfig::from_path(&path).map_err(|e| {
        warn!(target: "api", error = ?e, "config reload failed");
        api_error(StatusCode::UNPROCESSABLE_ENTITY, format!("{e:#}"))
    })?;
    match state.config.write() {
        Ok(mut w) => {
            *w = fresh;
            info!(target: "api", path = %path.display(), "engine config reloaded");
            Ok("reloaded".to_string())
        }
        Err(_) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed: lock poisoned",
        )),
    }
}

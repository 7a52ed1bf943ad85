// src/lib.rs
// Public library surface for the dashboard adapters and integration tests.

pub mod aggregate;
pub mod api;
pub mod classify;
pub mod config;
pub mod deal;
pub mod decode;
pub mod engine;
pub mod metrics;
pub mod select;
pub mod shape;
pub mod signal;
pub mod taxonomy;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::EngineConfig;
pub use crate::deal::DealRecord;
pub use crate::engine::{Dashboard, Engine};
pub use crate::select::{select_primary_signal, summarize_deal};
pub use crate::shape::normalize_signals;
pub use crate::signal::{Action, Nba, Signal};

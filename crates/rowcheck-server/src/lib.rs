#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use rowcheck_core::{ScanPolicy, StorageLayout};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::Mutex;

mod config;
mod http;
mod middleware;

pub use config::{validate_startup_config_contract, ServerConfig};

pub const CRATE_NAME: &str = "rowcheck-server";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<StorageLayout>,
    pub scan_policy: Arc<ScanPolicy>,
    /// Held while the report is rewritten or read, so a download never
    /// observes a report mid-replacement.
    pub(crate) report_slot: Arc<Mutex<()>>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            storage: Arc::new(config.storage_layout()),
            scan_policy: Arc::new(config.scan_policy()),
            config: Arc::new(config),
            report_slot: Arc::new(Mutex::new(())),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Builds the state and makes sure both storage directories exist.
    pub fn prepare(config: ServerConfig) -> rowcheck_core::Result<Self> {
        let state = Self::new(config);
        state.storage.ensure()?;
        Ok(state)
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::home_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/upload", post(http::handlers::upload_handler))
        .route("/validate", post(http::handlers::validate_handler))
        .route("/download", get(http::handlers::download_handler))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .with_state(state)
}

#![forbid(unsafe_code)]

use rowcheck_server::{build_router, validate_startup_config_contract, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                error!("signal handler registration failed; falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_json);
    validate_startup_config_contract(&config)?;
    info!(
        config = %serde_json::to_string(&config).unwrap_or_default(),
        "effective configuration"
    );

    let bind_addr = config.bind_addr.clone();
    let drain = config.shutdown_drain;
    let state = AppState::prepare(config).map_err(|e| format!("storage setup failed: {e}"))?;
    info!(
        upload_dir = %state.storage.input_dir().display(),
        report_dir = %state.storage.report_dir().display(),
        "storage ready"
    );

    let listener = TcpListener::bind(bind_addr.as_str())
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("rowcheck-server listening on {bind_addr}");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            info!("shutdown requested");
            if !drain.is_zero() {
                tokio::time::sleep(drain).await;
            }
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}

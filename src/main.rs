//! Tourney Back binary entrypoint wiring the row store, caches and REST API.

use std::{env, fs, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tourney_back::{
    cache::SystemClock,
    config::AppConfig,
    dao::row_store::{MemoryRowStore, RowStore},
    routes,
    state::{AppState, SharedState},
};

/// Optional JSON document seeding the in-memory store.
const SEED_PATH_ENV: &str = "ROW_STORE_SEED_PATH";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = build_store()?;
    probe_store(store.as_ref(), &config).await;

    let app_state = AppState::new(store, config, Arc::new(SystemClock));
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the hosted row store when it is configured, the in-memory one otherwise.
fn build_store() -> anyhow::Result<Arc<dyn RowStore>> {
    #[cfg(feature = "rest-store")]
    {
        use tourney_back::dao::row_store::rest::{RestConfig, RestRowStore};

        match RestConfig::from_env() {
            Ok(rest_config) => {
                info!(base_url = %rest_config.base_url, "using hosted row store");
                let store = RestRowStore::new(rest_config).context("building row store client")?;
                return Ok(Arc::new(store));
            }
            Err(err) => warn!(error = %err, "hosted row store not configured"),
        }
    }

    warn!("serving from the in-memory row store");
    let Some(path) = env::var_os(SEED_PATH_ENV) else {
        return Ok(Arc::new(MemoryRowStore::new()));
    };
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading seed file {}", path.to_string_lossy()))?;
    let store = MemoryRowStore::from_json(&contents).context("parsing seed file")?;
    info!(path = %path.to_string_lossy(), "seeded in-memory row store");
    Ok(Arc::new(store))
}

/// Check connectivity once at startup. Failure is logged, not fatal: reads
/// retry on their own and the health route reports the degraded state.
async fn probe_store(store: &dyn RowStore, config: &AppConfig) {
    match config.retry().run(|| store.health_check()).await {
        Ok(()) => info!("row store reachable"),
        Err(err) => warn!(error = %err, "row store unreachable at startup"),
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

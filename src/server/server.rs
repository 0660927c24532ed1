use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::select;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::Instant;
use tracing::info;

use crate::config::service::{PoolConfig, ServiceConfig};
use crate::config::settings::MetricsConfig;
use crate::issuer::IssueToken;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::pool::manager::PoolManager;
use crate::server::routes;

/// Static facts the HTTP layer reports or falls back on.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub environment: String,
    pub project_id: String,
    pub pool: PoolConfig,
    pub started_at: Instant,
}

pub struct AppState<I> {
    pub pool: Arc<PoolManager<I>>,
    pub metrics_state: MetricsState,
    pub info: Arc<ServiceInfo>,
}

impl<I> Clone for AppState<I> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            metrics_state: self.metrics_state.clone(),
            info: self.info.clone(),
        }
    }
}

impl<I> AppState<I> {
    pub async fn new(pool: PoolManager<I>, info: ServiceInfo) -> Self {
        let metrics = get_metrics().await;
        Self {
            pool: Arc::new(pool),
            metrics_state: MetricsState::new(metrics.registry.clone()),
            info: Arc::new(info),
        }
    }
}

pub fn build_router<I>(state: AppState<I>, metrics_config: &MetricsConfig) -> Router
where
    I: IssueToken + Send + Sync + 'static,
{
    Router::new()
        .merge(state.metrics_state.router::<I>(metrics_config))
        .merge(routes::router::<I>())
        .fallback(routes::not_found)
        .with_state(state)
}

/// Serve the pool manager until SIGINT or SIGTERM.
pub async fn start<I>(service_config: &ServiceConfig, pool: PoolManager<I>) -> Result<()>
where
    I: IssueToken + Send + Sync + 'static,
{
    let settings = &service_config.settings;
    let info = ServiceInfo {
        environment: settings.environment.clone(),
        project_id: service_config.issuer.project_id.clone(),
        pool: service_config.pool.clone(),
        started_at: Instant::now(),
    };
    let state = AppState::new(pool, info).await;
    let app = build_router(state, &settings.metrics);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;

    info!("token pool service listening on {}", addr);
    info!("project id: {}", service_config.issuer.project_id);
    info!("app id: {}", service_config.issuer.app_id);
    info!("environment: {}", settings.environment);
    info!("endpoints: POST /refresh-tokens, POST /pregenerate-pool, GET /tokens, GET /health, GET /debug/issuer");

    let metrics = get_metrics().await;
    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    metrics.up.set(0);

    info!("process terminated");
    Ok(())
}

async fn shutdown_signal() {
    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(i), Ok(t)) => (i, t),
        _ => {
            // without signal handlers the server only stops with the process
            std::future::pending::<()>().await;
            return;
        }
    };
    select! {
        _ = sigint.recv() => info!("received SIGINT, shutting down gracefully"),
        _ = sigterm.recv() => info!("received SIGTERM, shutting down gracefully"),
    }
}

use crate::config::settings::MetricsConfig;
use crate::issuer::IssueToken;
use crate::server::server::AppState;
use axum::routing::get;
use axum::{extract::State, response::IntoResponse, Router};
use http::{header::CONTENT_TYPE, StatusCode};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::error;

#[derive(Clone)]
pub struct MetricsState {
    pub registry: Registry,
}

impl MetricsState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn router<I>(&self, metrics_config: &MetricsConfig) -> Router<AppState<I>>
    where
        I: IssueToken + Send + Sync + 'static,
    {
        let mut router = Router::new();
        if metrics_config.is_enabled {
            router = router.route(metrics_config.path.as_str(), get(get_metrics::<I>));
        }
        router
    }
}

async fn get_metrics<I>(State(state): State<AppState<I>>) -> impl IntoResponse
where
    I: IssueToken + Send + Sync + 'static,
{
    let encoder = TextEncoder::new();
    let metric_families = state.metrics_state.registry.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, [(CONTENT_TYPE, "text/plain")], String::new());
    }

    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        String::from_utf8_lossy(&buffer).into_owned(),
    )
}

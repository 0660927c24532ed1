use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::SecondsFormat;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{PoolError, PoolResult};
use crate::helpers::time::now_utc;
use crate::issuer::diagnostics::run_diagnostics;
use crate::issuer::IssueToken;
use crate::server::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub count: Option<i64>,
    pub ttl: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PregenerateRequest {
    pub total_tokens: Option<i64>,
    pub batch_size: Option<i64>,
}

/// Optional JSON request body.
///
/// No JSON content type or a blank body means "use the defaults"; a body that
/// is present but does not deserialize is a [`PoolError::InvalidArgument`].
#[derive(Debug)]
pub struct JsonBody<T>(pub Option<T>);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = PoolError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json") || v.contains("+json"));
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| PoolError::invalid_argument(e.body_text()))?;

        if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(None));
        }
        Json::<T>::from_bytes(&bytes)
            .map(|Json(value)| JsonBody(Some(value)))
            .map_err(|e| PoolError::invalid_argument(e.body_text()))
    }
}

pub fn router<I>() -> Router<AppState<I>>
where
    I: IssueToken + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(root::<I>))
        .route("/health", get(health::<I>))
        .route("/refresh-tokens", post(refresh_tokens::<I>))
        .route("/pregenerate-pool", post(pregenerate_pool::<I>))
        .route("/tokens", get(tokens::<I>))
        .route("/debug/issuer", get(debug_issuer::<I>))
}

impl IntoResponse for PoolError {
    fn into_response(self) -> Response {
        let status = match self {
            PoolError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            PoolError::Issuance { .. } => StatusCode::BAD_GATEWAY,
            PoolError::StoreRead { .. } | PoolError::StoreWrite { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let mut body = json!({ "error": self.to_string(), "kind": self.kind() });
        if let Some(code) = self.code() {
            body["code"] = Value::String(code.to_owned());
        }
        (status, Json(body)).into_response()
    }
}

/// Generate one batch, merge it into the store and answer with the new batch only.
async fn refresh_tokens<I>(
    State(state): State<AppState<I>>,
    JsonBody(body): JsonBody<RefreshRequest>,
) -> PoolResult<impl IntoResponse>
where
    I: IssueToken + Send + Sync + 'static,
{
    let req = body.unwrap_or_default();
    let defaults = &state.info.pool;
    let count = non_negative("count", req.count, defaults.default_count)?;
    let ttl = non_negative("ttl", req.ttl, defaults.default_ttl_seconds)?;

    let tokens = state.pool.generate_batch(count, ttl).await?;
    state.pool.persist(tokens.clone()).await?;
    Ok(Json(tokens))
}

async fn pregenerate_pool<I>(
    State(state): State<AppState<I>>,
    JsonBody(body): JsonBody<PregenerateRequest>,
) -> PoolResult<impl IntoResponse>
where
    I: IssueToken + Send + Sync + 'static,
{
    let req = body.unwrap_or_default();
    let defaults = &state.info.pool;
    let total = non_negative("totalTokens", req.total_tokens, defaults.default_total_tokens)?;
    let batch_size = non_negative("batchSize", req.batch_size, defaults.default_batch_size)?;

    let pool = state
        .pool
        .generate_pool(total, batch_size, defaults.default_ttl_seconds)
        .await?;
    Ok(Json(pool))
}

async fn tokens<I>(State(state): State<AppState<I>>) -> PoolResult<impl IntoResponse>
where
    I: IssueToken + Send + Sync + 'static,
{
    Ok(Json(state.pool.read_valid().await?))
}

async fn debug_issuer<I>(State(state): State<AppState<I>>) -> impl IntoResponse
where
    I: IssueToken + Send + Sync + 'static,
{
    let report = run_diagnostics(
        state.pool.adapter(),
        state.pool.app_id(),
        &state.info.project_id,
        state.info.pool.default_ttl_seconds,
    )
    .await;
    Json(report)
}

async fn health<I>(State(state): State<AppState<I>>) -> impl IntoResponse
where
    I: IssueToken + Send + Sync + 'static,
{
    Json(json!({
        "status": "healthy",
        "timestamp": now_utc().to_rfc3339_opts(SecondsFormat::Millis, true),
        "uptime": state.info.started_at.elapsed().as_secs_f64(),
    }))
}

async fn root<I>(State(state): State<AppState<I>>) -> impl IntoResponse
where
    I: IssueToken + Send + Sync + 'static,
{
    Json(json!({
        "message": "token pool service is running",
        "environment": state.info.environment,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Route not found" })))
}

fn non_negative(name: &str, value: Option<i64>, default: u64) -> PoolResult<u64> {
    match value {
        None => Ok(default),
        Some(v) => u64::try_from(v)
            .map_err(|_| PoolError::invalid_argument(format!("{} must not be negative, got {}", name, v))),
    }
}

use std::collections::HashMap;
use std::time::Duration;
use std::{env, fs};

use anyhow::{anyhow, Result};
use http::Method;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::service::{GenericSourceValue, IssuerConfig};
use crate::error::{PoolError, PoolResult};
use crate::issuer::{IssueToken, IssuedToken};

pub const CODE_UNAVAILABLE: &str = "unavailable";
pub const CODE_INVALID_RESPONSE: &str = "invalid-response";

/// Issuance authority reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTokenIssuer {
    url: String,
    method: Method,
    headers: HashMap<String, GenericSourceValue>,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueRequest<'a> {
    app_id: &'a str,
    ttl_millis: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueResponse {
    token: String,
    ttl_millis: Option<u64>,
}

impl HttpTokenIssuer {
    pub fn new(cfg: &IssuerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;
        Ok(Self::with_client(cfg, client))
    }

    pub fn with_client(cfg: &IssuerConfig, client: Client) -> Self {
        Self {
            url: cfg.url.clone(),
            method: cfg.method.clone(),
            headers: cfg.headers.clone().unwrap_or_default(),
            client,
        }
    }
}

impl IssueToken for HttpTokenIssuer {
    async fn issue(&self, app_id: &str, ttl_millis: u64) -> PoolResult<IssuedToken> {
        let mut request = self
            .client
            .request(self.method.clone(), &self.url)
            .json(&IssueRequest { app_id, ttl_millis });

        for (key, v) in &self.headers {
            let value = prepare_generic_source_value(v)
                .map_err(|e| PoolError::invalid_argument(format!("header '{}': {}", key, e)))?;
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PoolError::issuance(CODE_UNAVAILABLE, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PoolError::issuance(CODE_UNAVAILABLE, e.to_string()))?;

        if !status.is_success() {
            debug!("issuer responded {}: {}", status, body);
            return Err(vendor_error(status, &body));
        }

        let parsed: IssueResponse = serde_json::from_str(&body)
            .map_err(|e| PoolError::issuance(CODE_INVALID_RESPONSE, e.to_string()))?;
        if parsed.token.is_empty() {
            return Err(PoolError::issuance(CODE_INVALID_RESPONSE, "empty token in response"));
        }

        Ok(IssuedToken {
            token: parsed.token,
            ttl_millis: parsed.ttl_millis,
        })
    }
}

/// Map a non-2xx answer to a vendor error.
///
/// Accepts `{"code","message"}` and Google-style `{"error":{"status","message"}}`;
/// anything else is reported under the HTTP status.
fn vendor_error(status: http::StatusCode, body: &str) -> PoolError {
    let json: Option<Value> = serde_json::from_str(body).ok();
    let field = |pointers: &[&str]| -> Option<String> {
        let json = json.as_ref()?;
        pointers
            .iter()
            .filter_map(|p| json.pointer(p))
            .find_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    };

    let code = field(&["/code", "/error/status", "/error/code"])
        .unwrap_or_else(|| format!("http-{}", status.as_u16()));
    let message = field(&["/message", "/error/message"]).unwrap_or_else(|| {
        if body.is_empty() {
            status.to_string()
        } else {
            body.to_owned()
        }
    });
    PoolError::issuance(code, message)
}

fn prepare_generic_source_value(value: &GenericSourceValue) -> Result<String> {
    match value {
        GenericSourceValue::Literal { value } => Ok(value.to_owned()),
        GenericSourceValue::FromEnv { from_env } => env::var(from_env)
            .map_err(|err| anyhow!("env '{}': {}", from_env, err)),
        GenericSourceValue::FromFile { path } => fs::read_to_string(path)
            .map_err(|err| anyhow!("file '{}': {}", path, err))
            .map(|res| res.trim().to_string()),
    }
}

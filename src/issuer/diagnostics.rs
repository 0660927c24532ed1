//! Issuer diagnostics: try the configured app id in the formats the authority
//! may expect and report which one works. Nothing is persisted.

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::issuer::adapter::TokenSourceAdapter;
use crate::issuer::IssueToken;

pub const CODE_INVALID_APP_RESOURCE_NAME: &str = "app-check/invalid-app-resource-name";
pub const CODE_APP_NOT_REGISTERED: &str = "app-check/app-not-registered";
pub const CODE_PERMISSION_DENIED: &str = "permission-denied";

const PREVIEW_CHARS: usize = 30;

/// Operator hint for the vendor codes worth explaining.
pub fn hint_for(code: &str) -> Option<&'static str> {
    match code {
        CODE_INVALID_APP_RESOURCE_NAME => Some("app id format is invalid or the app was not found"),
        CODE_APP_NOT_REGISTERED => Some("app exists but is not registered for attestation"),
        CODE_PERMISSION_DENIED | "PERMISSION_DENIED" => {
            Some("issuer credentials lack the permission to mint tokens")
        }
        _ => None,
    }
}

/// The raw id, the fully qualified resource name, and the id with any
/// `projects/<p>/apps/` prefix removed. Empty and duplicate entries are dropped.
pub fn candidate_app_ids(app_id: &str, project_id: &str) -> Vec<String> {
    let app_id = app_id.trim();
    if app_id.is_empty() {
        return Vec::new();
    }
    let prefix = Regex::new(r"^projects/[^/]+/apps/").expect("static regex");

    let mut candidates = vec![app_id.to_owned()];
    if !project_id.is_empty() && !prefix.is_match(app_id) {
        candidates.push(format!("projects/{}/apps/{}", project_id, app_id));
    }
    candidates.push(prefix.replace(app_id, "").into_owned());

    let mut unique: Vec<String> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if !c.is_empty() && !unique.contains(&c) {
            unique.push(c);
        }
    }
    unique
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticAttempt {
    pub app_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    pub project_id: String,
    pub app_id: String,
    pub ttl_seconds: u64,
    pub attempts: Vec<DiagnosticAttempt>,
    /// app id of the first candidate that succeeded
    pub working_app_id: Option<String>,
}

/// Try candidates in order and stop at the first success.
pub async fn run_diagnostics<I: IssueToken>(
    adapter: &TokenSourceAdapter<I>,
    app_id: &str,
    project_id: &str,
    ttl_seconds: u64,
) -> DiagnosticsReport {
    let mut attempts = Vec::new();
    let mut working_app_id = None;

    for candidate in candidate_app_ids(app_id, project_id) {
        info!("diagnostics: testing app id '{}'", candidate);
        match adapter.issue(&candidate, ttl_seconds).await {
            Ok(record) => {
                info!("diagnostics: app id '{}' works", candidate);
                attempts.push(DiagnosticAttempt {
                    app_id: candidate.clone(),
                    success: true,
                    token_preview: Some(preview(&record.token)),
                    code: None,
                    message: None,
                    hint: None,
                });
                working_app_id = Some(candidate);
                break;
            }
            Err(e) => {
                warn!("diagnostics: app id '{}' failed: {}", candidate, e);
                let code = e.code().unwrap_or(e.kind()).to_owned();
                attempts.push(DiagnosticAttempt {
                    app_id: candidate,
                    success: false,
                    token_preview: None,
                    hint: hint_for(&code).map(str::to_owned),
                    code: Some(code),
                    message: Some(e.to_string()),
                });
            }
        }
    }

    DiagnosticsReport {
        project_id: project_id.to_owned(),
        app_id: app_id.to_owned(),
        ttl_seconds,
        attempts,
        working_app_id,
    }
}

fn preview(token: &str) -> String {
    let head: String = token.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

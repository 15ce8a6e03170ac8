//! Error types for the social API client.
//!
//! # Design
//! Errors are classified by how the rest of the client must react to them:
//! `Unauthorized` drives the global logout path, `Validation` stays local to
//! the call that triggered it, everything else is a generic failure. Every
//! variant carries a human-readable message derived from the response body,
//! and the type is `Clone` so one failed fetch can be handed to every reader
//! coalesced onto it.

use serde_json::Value;
use thiserror::Error;

use crate::http::HttpResponse;

/// One entry of a structured validation error list (`detail: [{loc, msg}]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub loc: Vec<String>,
    pub msg: String,
}

impl ValidationIssue {
    fn from_value(value: &Value) -> Self {
        let loc = value
            .get("loc")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let msg = value
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self { loc, msg }
    }

    fn render(&self) -> String {
        let field = if self.loc.is_empty() {
            "Field".to_string()
        } else {
            self.loc.join(" -> ")
        };
        let msg = if self.msg.is_empty() {
            "Invalid value"
        } else {
            self.msg.as_str()
        };
        format!("{field}: {msg}")
    }
}

/// Errors returned by the client, the API surface and the query layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The server returned 401. The session has already been torn down.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The server rejected the input (422 or a structured `detail` list).
    #[error("{message}")]
    Validation {
        message: String,
        issues: Vec<ValidationIssue>,
    },

    /// The server returned 404.
    #[error("{message}")]
    NotFound { message: String },

    /// Any other non-2xx status.
    #[error("{message}")]
    Http {
        status: u16,
        body: String,
        message: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Classify a non-2xx response and derive its caller-visible message.
    pub fn from_response(response: &HttpResponse) -> Self {
        let status = response.status;
        let detail = serde_json::from_str::<Value>(&response.body)
            .ok()
            .and_then(|body| body.get("detail").cloned());

        let issues = match &detail {
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(ValidationIssue::from_value)
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        };

        let message = match (&detail, &issues) {
            (_, Some(issues)) => issues
                .iter()
                .map(ValidationIssue::render)
                .collect::<Vec<_>>()
                .join(", "),
            (Some(Value::String(text)), _) => text.clone(),
            _ => format!("Request failed with status code {status}"),
        };

        match status {
            401 => ApiError::Unauthorized { message },
            404 => ApiError::NotFound { message },
            _ if status == 422 || issues.is_some() => ApiError::Validation {
                message,
                issues: issues.unwrap_or_default(),
            },
            _ => ApiError::Http {
                status,
                body: response.body.clone(),
                message,
            },
        }
    }

    /// HTTP status behind the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Validation { .. } => Some(422),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation { .. })
    }

    /// Whether an automatic fetch retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ApiError::Unauthorized { .. } | ApiError::Validation { .. }
        )
    }
}

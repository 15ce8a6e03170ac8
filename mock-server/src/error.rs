use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// One entry of a 422 `detail` list.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Handler failures, rendered the way the real backend renders them:
/// `{"detail": "..."}`, or `{"detail": [FieldError, ...]}` for 422.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Validation(Vec<FieldError>),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn missing(field: &str) -> Self {
        AppError::Validation(vec![FieldError {
            loc: vec!["body".into(), field.into()],
            msg: "Field required".into(),
            kind: "missing",
        }])
    }

    pub fn invalid(field: &str, msg: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError {
            loc: vec!["body".into(), field.into()],
            msg: msg.into(),
            kind: "value_error",
        }])
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!(msg)),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!(msg)),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!(msg)),
            AppError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, json!(errors)),
        };
        tracing::debug!(%status, %detail, "request rejected");
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

//! Request extractors shared by the route handlers.

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::{header, request::Parts},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::error::{AppError, FieldError};
use crate::store::Db;

/// The user behind the request's bearer token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

        db.read()
            .await
            .session_user(token)
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))
    }
}

/// `Json` whose rejections come out as a 422 `detail` list.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::Validation(vec![FieldError {
                loc: vec!["body".into()],
                msg: rejection.body_text(),
                kind: "json_invalid",
            }])),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A fully buffered `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct Form {
    fields: HashMap<String, String>,
    files: HashMap<String, FilePart>,
}

impl Form {
    /// A text field that must be present and non-empty.
    pub fn required(&self, name: &str) -> Result<String, AppError> {
        self.optional(name).ok_or_else(|| AppError::missing(name))
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        self.fields.get(name).filter(|v| !v.is_empty()).cloned()
    }

    pub fn file(&self, name: &str) -> Result<&FilePart, AppError> {
        self.files.get(name).ok_or_else(|| AppError::missing(name))
    }
}

impl<S> FromRequest<S> for Form
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let malformed = |e: &dyn std::fmt::Display| AppError::invalid("form", e.to_string());

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| malformed(&e))?;
        let mut form = Form::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| malformed(&e))? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await.map_err(|e| malformed(&e))?.to_vec();
                    form.files.insert(name, FilePart { filename, bytes });
                }
                None => {
                    let text = field.text().await.map_err(|e| malformed(&e))?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }
}

/// `?skip=&limit=` with per-route default limits.
#[derive(Debug, Default, Deserialize)]
pub struct Page {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl Page {
    pub fn slice<T>(&self, items: impl Iterator<Item = T>, default_limit: usize) -> Vec<T> {
        items
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(default_limit))
            .collect()
    }
}

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::error::AppError;
use crate::extract::Form;
use crate::store::{Db, NewUser, UserView};

pub const MIN_PASSWORD_LEN: usize = 8;

/// POST /auth/register (multipart). Answers with the created account only;
/// the client logs in separately.
pub async fn register(State(db): State<Db>, form: Form) -> Result<Json<UserView>, AppError> {
    let new = NewUser {
        name: form.required("name")?,
        username: form.required("username")?,
        email: form.required("email")?,
        password: form.required("password")?,
        phone: form.optional("phone"),
        address: form.optional("address"),
        bio: form.optional("bio"),
        profile_pic: form.optional("profile_pic"),
    };
    if !is_email(&new.email) {
        return Err(AppError::invalid(
            "email",
            "value is not a valid email address",
        ));
    }
    check_password("password", &new.password)?;

    let mut store = db.write().await;
    if store.find_by_email(&new.email).is_some() {
        return Err(AppError::BadRequest("Email or phone already registered.".into()));
    }
    if store.find_by_username(&new.username).is_some() {
        return Err(AppError::BadRequest("Username already taken".into()));
    }
    let id = store.add_user(new);
    info!(id, "user registered");
    store.user_view(id).map(Json).ok_or_else(|| AppError::not_found("User"))
}

/// POST /auth/login (multipart).
pub async fn login(State(db): State<Db>, form: Form) -> Result<Json<Value>, AppError> {
    let email = form.required("email")?;
    let password = form.required("password")?;

    let mut store = db.write().await;
    let user_id = store
        .find_by_email(&email)
        .filter(|u| u.password == password)
        .map(|u| u.id)
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;
    let token = store.open_session(user_id);
    info!(user_id, "user logged in");
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

pub fn check_password(field: &str, password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::invalid(
            field,
            format!("String should have at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

fn is_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::auth::check_password;
use crate::error::AppError;
use crate::extract::{CurrentUser, JsonBody};
use crate::store::{Db, UserView};

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordUpdate {
    pub current_password: String,
    pub new_password: String,
}

pub async fn all(State(db): State<Db>, _: CurrentUser) -> Json<Vec<UserView>> {
    let store = db.read().await;
    Json(store.users.values().map(UserView::from).collect())
}

pub async fn me(State(db): State<Db>, CurrentUser(me): CurrentUser) -> Result<Json<UserView>, AppError> {
    let store = db.read().await;
    store.user_view(me).map(Json).ok_or_else(|| AppError::not_found("User"))
}

pub async fn get(
    State(db): State<Db>,
    _: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserView>, AppError> {
    let store = db.read().await;
    store
        .user_view(user_id)
        .map(Json)
        .ok_or_else(|| AppError::not_found("User"))
}

/// PUT /users/me. Only fields present in the body change.
pub async fn update_me(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<UserView>, AppError> {
    let mut store = db.write().await;
    if let Some(username) = update.username.as_deref().filter(|u| !u.is_empty()) {
        if store.find_by_username(username).is_some_and(|u| u.id != me) {
            return Err(AppError::BadRequest("Username already taken".into()));
        }
    }

    let user = store.users.get_mut(me).ok_or_else(|| AppError::not_found("User"))?;
    if let Some(username) = update.username.filter(|u| !u.is_empty()) {
        user.username = username;
    }
    if let Some(bio) = update.bio {
        user.bio = Some(bio);
    }
    if let Some(profile_pic) = update.profile_pic {
        user.profile_pic = Some(profile_pic);
    }
    Ok(Json(UserView::from(&*user)))
}

pub async fn update_password(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    JsonBody(update): JsonBody<PasswordUpdate>,
) -> Result<Json<Value>, AppError> {
    check_password("new_password", &update.new_password)?;

    let mut store = db.write().await;
    let user = store.users.get_mut(me).ok_or_else(|| AppError::not_found("User"))?;
    if user.password != update.current_password {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    user.password = update.new_password;
    Ok(Json(json!({ "message": "Password updated successfully" })))
}

pub async fn delete_me(State(db): State<Db>, CurrentUser(me): CurrentUser) -> Json<Value> {
    db.write().await.delete_user(me);
    info!(id = me, "account deleted");
    Json(json!({ "message": "Account deleted successfully" }))
}

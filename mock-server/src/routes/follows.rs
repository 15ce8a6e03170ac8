use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::{CurrentUser, Page};
use crate::store::{Db, FollowRecord, Store};

pub const PAGE_LIMIT: usize = 50;

fn require_user(store: &Store, user_id: i64) -> Result<(), AppError> {
    match store.users.get(user_id) {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("User")),
    }
}

fn edges(store: &Store, page: &Page, keep: impl Fn(&FollowRecord) -> bool) -> Json<Vec<FollowRecord>> {
    Json(page.slice(store.follows.values().filter(|f| keep(f)).cloned(), PAGE_LIMIT))
}

pub async fn follow(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let mut store = db.write().await;
    let username = store
        .users
        .get(user_id)
        .map(|u| u.username.clone())
        .ok_or_else(|| AppError::not_found("User"))?;
    if user_id == me {
        return Err(AppError::BadRequest("You cannot follow yourself".into()));
    }
    if store.follow_edge(me, user_id).is_some() {
        return Err(AppError::BadRequest("You are already following this user".into()));
    }

    let id = store.follows.insert(|id| FollowRecord {
        id,
        follower_id: me,
        following_id: user_id,
        created_at: Utc::now(),
    });
    Ok(Json(json!({
        "message": format!("You are now following {username}"),
        "follow": store.follows.get(id),
    })))
}

pub async fn unfollow(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let mut store = db.write().await;
    let id = store
        .follow_edge(me, user_id)
        .map(|f| f.id)
        .ok_or_else(|| AppError::NotFound("You are not following this user".into()))?;
    store.follows.remove(id);
    Ok(Json(json!({ "message": "Successfully unfollowed user" })))
}

pub async fn followers(
    State(db): State<Db>,
    _: CurrentUser,
    Path(user_id): Path<i64>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<FollowRecord>>, AppError> {
    let store = db.read().await;
    require_user(&store, user_id)?;
    Ok(edges(&store, &page, |f| f.following_id == user_id))
}

pub async fn following(
    State(db): State<Db>,
    _: CurrentUser,
    Path(user_id): Path<i64>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<FollowRecord>>, AppError> {
    let store = db.read().await;
    require_user(&store, user_id)?;
    Ok(edges(&store, &page, |f| f.follower_id == user_id))
}

pub async fn my_followers(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Query(page): Query<Page>,
) -> Json<Vec<FollowRecord>> {
    edges(&*db.read().await, &page, |f| f.following_id == me)
}

pub async fn my_following(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Query(page): Query<Page>,
) -> Json<Vec<FollowRecord>> {
    edges(&*db.read().await, &page, |f| f.follower_id == me)
}

pub async fn stats(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let store = db.read().await;
    require_user(&store, user_id)?;
    let followers = store.follows.values().filter(|f| f.following_id == user_id).count();
    let following = store.follows.values().filter(|f| f.follower_id == user_id).count();
    Ok(Json(json!({
        "user_id": user_id,
        "followers_count": followers,
        "following_count": following,
        "is_following": store.follow_edge(me, user_id).is_some(),
    })))
}

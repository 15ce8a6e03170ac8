use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::{CurrentUser, Page};
use crate::store::{Db, LikeRecord, LikeView, Store};

pub const PAGE_LIMIT: usize = 50;

fn require_post(store: &Store, post_id: i64) -> Result<(), AppError> {
    match store.posts.get(post_id) {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("Post")),
    }
}

/// POST /likes/post/{id}: like if not liked, unlike otherwise.
pub async fn toggle(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let mut store = db.write().await;
    require_post(&store, post_id)?;

    let existing = store
        .likes
        .values()
        .find(|l| l.post_id == post_id && l.user_id == me)
        .map(|l| l.id);
    if let Some(id) = existing {
        store.likes.remove(id);
        return Ok(Json(json!({ "message": "Post unliked", "liked": false })));
    }

    let id = store.likes.insert(|id| LikeRecord {
        id,
        user_id: me,
        post_id,
        created_at: Utc::now(),
    });
    let like = store.likes.get(id).and_then(|l| store.like_view(l));
    Ok(Json(json!({ "message": "Post liked", "liked": true, "like": like })))
}

pub async fn list_by_post(
    State(db): State<Db>,
    _: CurrentUser,
    Path(post_id): Path<i64>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<LikeView>>, AppError> {
    let store = db.read().await;
    require_post(&store, post_id)?;
    let likes = store
        .likes
        .values()
        .filter(|l| l.post_id == post_id)
        .filter_map(|l| store.like_view(l));
    Ok(Json(page.slice(likes, PAGE_LIMIT)))
}

pub async fn count(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let store = db.read().await;
    require_post(&store, post_id)?;
    let likes: Vec<&LikeRecord> = store.likes.values().filter(|l| l.post_id == post_id).collect();
    Ok(Json(json!({
        "post_id": post_id,
        "likes_count": likes.len(),
        "user_liked": likes.iter().any(|l| l.user_id == me),
    })))
}

pub async fn list_mine(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Query(page): Query<Page>,
) -> Json<Vec<LikeView>> {
    let store = db.read().await;
    let likes = store
        .likes
        .values()
        .filter(|l| l.user_id == me)
        .filter_map(|l| store.like_view(l));
    Json(page.slice(likes, PAGE_LIMIT))
}

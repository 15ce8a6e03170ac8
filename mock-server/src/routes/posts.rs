use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::{CurrentUser, JsonBody, Page};
use crate::store::{Db, PostRecord, PostView, Store};

pub const PAGE_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct PostInput {
    pub content: String,
}

fn view(store: &Store, id: i64) -> Result<Json<PostView>, AppError> {
    store
        .posts
        .get(id)
        .and_then(|post| store.post_view(post))
        .map(Json)
        .ok_or_else(|| AppError::not_found("Post"))
}

fn list(store: &Store, page: &Page, keep: impl Fn(&PostRecord) -> bool) -> Json<Vec<PostView>> {
    let posts = store.posts.values().filter(|p| keep(p));
    Json(page.slice(posts.filter_map(|p| store.post_view(p)), PAGE_LIMIT))
}

/// The post `id`, if `me` wrote it.
fn owned<'a>(store: &'a mut Store, id: i64, me: i64, action: &str) -> Result<&'a mut PostRecord, AppError> {
    let post = store.posts.get_mut(id).ok_or_else(|| AppError::not_found("Post"))?;
    if post.user_id != me {
        return Err(AppError::Forbidden(format!("Not authorized to {action} this post")));
    }
    Ok(post)
}

pub async fn create(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    JsonBody(input): JsonBody<PostInput>,
) -> Result<Json<PostView>, AppError> {
    let mut store = db.write().await;
    let id = store.posts.insert(|id| PostRecord {
        id,
        user_id: me,
        content: input.content,
        created_at: Utc::now(),
    });
    view(&store, id)
}

pub async fn list_all(
    State(db): State<Db>,
    _: CurrentUser,
    Query(page): Query<Page>,
) -> Json<Vec<PostView>> {
    list(&*db.read().await, &page, |_| true)
}

pub async fn list_mine(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Query(page): Query<Page>,
) -> Json<Vec<PostView>> {
    list(&*db.read().await, &page, |p| p.user_id == me)
}

pub async fn list_by_user(
    State(db): State<Db>,
    _: CurrentUser,
    Path(user_id): Path<i64>,
    Query(page): Query<Page>,
) -> Json<Vec<PostView>> {
    list(&*db.read().await, &page, |p| p.user_id == user_id)
}

pub async fn get(
    State(db): State<Db>,
    _: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<PostView>, AppError> {
    view(&*db.read().await, id)
}

pub async fn update(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<PostInput>,
) -> Result<Json<PostView>, AppError> {
    let mut store = db.write().await;
    owned(&mut store, id, me, "update")?.content = input.content;
    view(&store, id)
}

pub async fn delete(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let mut store = db.write().await;
    owned(&mut store, id, me, "delete")?;
    store.delete_post(id);
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

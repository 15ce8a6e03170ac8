use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::{CurrentUser, JsonBody, Page};
use crate::store::{CommentRecord, CommentView, Db, Store};

pub const PAGE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub content: String,
}

fn view(store: &Store, id: i64) -> Result<Json<CommentView>, AppError> {
    store
        .comments
        .get(id)
        .and_then(|c| store.comment_view(c))
        .map(Json)
        .ok_or_else(|| AppError::not_found("Comment"))
}

fn owned<'a>(
    store: &'a mut Store,
    id: i64,
    me: i64,
    action: &str,
) -> Result<&'a mut CommentRecord, AppError> {
    let comment = store
        .comments
        .get_mut(id)
        .ok_or_else(|| AppError::not_found("Comment"))?;
    if comment.user_id != me {
        return Err(AppError::Forbidden(format!("Not authorized to {action} this comment")));
    }
    Ok(comment)
}

pub async fn create(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(post_id): Path<i64>,
    JsonBody(input): JsonBody<CommentInput>,
) -> Result<Json<CommentView>, AppError> {
    let mut store = db.write().await;
    if store.posts.get(post_id).is_none() {
        return Err(AppError::not_found("Post"));
    }
    let id = store.comments.insert(|id| CommentRecord {
        id,
        user_id: me,
        post_id,
        content: input.content,
        created_at: Utc::now(),
    });
    view(&store, id)
}

pub async fn list_by_post(
    State(db): State<Db>,
    _: CurrentUser,
    Path(post_id): Path<i64>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<CommentView>>, AppError> {
    let store = db.read().await;
    if store.posts.get(post_id).is_none() {
        return Err(AppError::not_found("Post"));
    }
    let comments = store
        .comments
        .values()
        .filter(|c| c.post_id == post_id)
        .filter_map(|c| store.comment_view(c));
    Ok(Json(page.slice(comments, PAGE_LIMIT)))
}

pub async fn list_mine(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Query(page): Query<Page>,
) -> Json<Vec<CommentView>> {
    let store = db.read().await;
    let comments = store
        .comments
        .values()
        .filter(|c| c.user_id == me)
        .filter_map(|c| store.comment_view(c));
    Json(page.slice(comments, PAGE_LIMIT))
}

pub async fn update(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<CommentInput>,
) -> Result<Json<CommentView>, AppError> {
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
    store.comments.remove(id);
    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}

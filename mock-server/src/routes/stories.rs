use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::AppError;
use crate::extract::{CurrentUser, JsonBody, Page};
use crate::store::{Db, Store, StoryRecord, StoryView, STORY_LIFETIME_HOURS};

pub const ACTIVE_PAGE_LIMIT: usize = 50;
pub const PAGE_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct StoryInput {
    pub content_url: String,
}

fn list(store: &Store, page: &Page, limit: usize, keep: impl Fn(&StoryRecord) -> bool) -> Json<Vec<StoryView>> {
    let stories = store
        .stories
        .values()
        .filter(|s| keep(s))
        .filter_map(|s| store.story_view(s));
    Json(page.slice(stories, limit))
}

pub async fn create(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    JsonBody(input): JsonBody<StoryInput>,
) -> Result<Json<StoryView>, AppError> {
    let mut store = db.write().await;
    let expire_at = Utc::now() + Duration::hours(STORY_LIFETIME_HOURS);
    let id = store.add_story(me, &input.content_url, expire_at);
    store
        .stories
        .get(id)
        .and_then(|s| store.story_view(s))
        .map(Json)
        .ok_or_else(|| AppError::not_found("Story"))
}

/// Everyone's unexpired, undeleted stories.
pub async fn list_active(
    State(db): State<Db>,
    _: CurrentUser,
    Query(page): Query<Page>,
) -> Json<Vec<StoryView>> {
    let now = Utc::now();
    list(&*db.read().await, &page, ACTIVE_PAGE_LIMIT, |s| s.is_live(now))
}

pub async fn list_by_user(
    State(db): State<Db>,
    _: CurrentUser,
    Path(user_id): Path<i64>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<StoryView>>, AppError> {
    let store = db.read().await;
    if store.users.get(user_id).is_none() {
        return Err(AppError::not_found("User"));
    }
    let now = Utc::now();
    Ok(list(&store, &page, PAGE_LIMIT, |s| s.user_id == user_id && s.is_live(now)))
}

/// The caller's own stories, expired and deleted ones included.
pub async fn list_mine(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Query(page): Query<Page>,
) -> Json<Vec<StoryView>> {
    list(&*db.read().await, &page, PAGE_LIMIT, |s| s.user_id == me)
}

/// Direct lookup. Expiry only hides stories from lists; a deleted story is
/// gone.
pub async fn get(
    State(db): State<Db>,
    _: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<StoryView>, AppError> {
    let store = db.read().await;
    store
        .stories
        .get(id)
        .filter(|s| s.is_active)
        .and_then(|s| store.story_view(s))
        .map(Json)
        .ok_or_else(|| AppError::not_found("Story"))
}

/// Soft delete.
pub async fn delete(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let mut store = db.write().await;
    let story = store
        .stories
        .get_mut(id)
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::not_found("Story"))?;
    if story.user_id != me {
        return Err(AppError::Forbidden("Not authorized to delete this story".into()));
    }
    story.is_active = false;
    Ok(Json(json!({ "message": "Story deleted successfully" })))
}

/// POST /stories/cleanup: deactivate every expired story.
pub async fn cleanup(State(db): State<Db>) -> Json<Value> {
    let mut store = db.write().await;
    let now = Utc::now();
    let mut cleaned = 0;
    let expired: Vec<i64> = store
        .stories
        .values()
        .filter(|s| s.is_active && s.expire_at <= now)
        .map(|s| s.id)
        .collect();
    for id in expired {
        if let Some(story) = store.stories.get_mut(id) {
            story.is_active = false;
            cleaned += 1;
        }
    }
    info!(cleaned, "expired stories deactivated");
    Json(json!({ "message": format!("Cleaned up {cleaned} expired stories") }))
}

//! `/stories`. The active list is filtered server-side to unexpired stories;
//! a direct fetch by id may still return an expired one.

use super::{Endpoint, Page};
use crate::error::ApiError;
use crate::types::{Message, Story, StoryId, StoryInput, UserId};

pub const ACTIVE_PAGE: Page = Page::first(50);
pub const DEFAULT_PAGE: Page = Page::first(20);

pub fn list_active(page: Page) -> Endpoint<Vec<Story>> {
    Endpoint::get(format!("/stories/?{page}"))
}

pub fn list_by_user(user_id: UserId, page: Page) -> Endpoint<Vec<Story>> {
    Endpoint::get(format!("/stories/user/{user_id}?{page}"))
}

pub fn list_mine(page: Page) -> Endpoint<Vec<Story>> {
    Endpoint::get(format!("/stories/me?{page}"))
}

pub fn get(id: StoryId) -> Endpoint<Story> {
    Endpoint::get(format!("/stories/{id}"))
}

pub fn create(content_url: &str) -> Result<Endpoint<Story>, ApiError> {
    Endpoint::post_json(
        "/stories/",
        &StoryInput {
            content_url: content_url.to_string(),
        },
    )
}

pub fn delete(id: StoryId) -> Endpoint<Message> {
    Endpoint::delete(format!("/stories/{id}"))
}

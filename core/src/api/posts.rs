//! `/posts`.

use super::{Endpoint, Page};
use crate::error::ApiError;
use crate::types::{Message, Post, PostId, PostInput, UserId};

pub const DEFAULT_PAGE: Page = Page::first(20);

pub fn list(page: Page) -> Endpoint<Vec<Post>> {
    Endpoint::get(format!("/posts/?{page}"))
}

pub fn get(id: PostId) -> Endpoint<Post> {
    Endpoint::get(format!("/posts/{id}"))
}

pub fn list_by_user(user_id: UserId, page: Page) -> Endpoint<Vec<Post>> {
    Endpoint::get(format!("/posts/user/{user_id}?{page}"))
}

pub fn list_mine(page: Page) -> Endpoint<Vec<Post>> {
    Endpoint::get(format!("/posts/me?{page}"))
}

pub fn create(content: &str) -> Result<Endpoint<Post>, ApiError> {
    Endpoint::post_json(
        "/posts/",
        &PostInput {
            content: content.to_string(),
        },
    )
}

pub fn update(id: PostId, input: &PostInput) -> Result<Endpoint<Post>, ApiError> {
    Endpoint::put_json(format!("/posts/{id}"), input)
}

pub fn delete(id: PostId) -> Endpoint<Message> {
    Endpoint::delete(format!("/posts/{id}"))
}

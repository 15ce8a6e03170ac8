//! `/comments`.

use super::{Endpoint, Page};
use crate::error::ApiError;
use crate::types::{Comment, CommentId, CommentInput, Message, PostId};

pub const DEFAULT_PAGE: Page = Page::first(50);

pub fn list_by_post(post_id: PostId, page: Page) -> Endpoint<Vec<Comment>> {
    Endpoint::get(format!("/comments/post/{post_id}?{page}"))
}

pub fn list_mine(page: Page) -> Endpoint<Vec<Comment>> {
    Endpoint::get(format!("/comments/me?{page}"))
}

pub fn create(post_id: PostId, content: &str) -> Result<Endpoint<Comment>, ApiError> {
    Endpoint::post_json(
        format!("/comments/post/{post_id}"),
        &CommentInput {
            content: content.to_string(),
        },
    )
}

pub fn update(id: CommentId, input: &CommentInput) -> Result<Endpoint<Comment>, ApiError> {
    Endpoint::put_json(format!("/comments/{id}"), input)
}

pub fn delete(id: CommentId) -> Endpoint<Message> {
    Endpoint::delete(format!("/comments/{id}"))
}

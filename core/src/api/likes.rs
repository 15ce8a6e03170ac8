//! `/likes`. Liking is a single toggle endpoint; the client never sends the
//! desired state, so the server's reply is the only truth.

use super::{Endpoint, Page};
use crate::types::{Like, LikeStatus, PostId, ToggleLike};

pub const DEFAULT_PAGE: Page = Page::first(50);

pub fn toggle(post_id: PostId) -> Endpoint<ToggleLike> {
    Endpoint::post_empty(format!("/likes/post/{post_id}"))
}

/// Count plus whether the current user liked the post.
pub fn status(post_id: PostId) -> Endpoint<LikeStatus> {
    Endpoint::get(format!("/likes/post/{post_id}/count"))
}

pub fn list_by_post(post_id: PostId, page: Page) -> Endpoint<Vec<Like>> {
    Endpoint::get(format!("/likes/post/{post_id}?{page}"))
}

pub fn list_mine(page: Page) -> Endpoint<Vec<Like>> {
    Endpoint::get(format!("/likes/me?{page}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse};

    #[test]
    fn toggle_posts_without_body() {
        let endpoint = toggle(5);
        assert_eq!(endpoint.request.method, HttpMethod::Post);
        assert_eq!(endpoint.request.path, "/likes/post/5");
        assert!(endpoint.request.body.is_empty());
    }

    #[test]
    fn status_parses_aggregate() {
        let endpoint = status(5);
        assert_eq!(endpoint.request.path, "/likes/post/5/count");
        let parsed = endpoint
            .parse(&HttpResponse::new(
                200,
                r#"{"post_id":5,"likes_count":3,"user_liked":false}"#,
            ))
            .unwrap();
        assert_eq!(
            parsed,
            LikeStatus {
                post_id: 5,
                likes_count: 3,
                user_liked: false
            }
        );
    }
}

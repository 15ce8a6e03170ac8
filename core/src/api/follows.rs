//! `/follow`.

use super::{Endpoint, Page};
use crate::types::{Follow, FollowStats, Message, UserId};

pub const DEFAULT_PAGE: Page = Page::first(50);

pub fn follow(user_id: UserId) -> Endpoint<Message> {
    Endpoint::post_empty(format!("/follow/{user_id}"))
}

pub fn unfollow(user_id: UserId) -> Endpoint<Message> {
    Endpoint::delete(format!("/follow/{user_id}"))
}

pub fn stats(user_id: UserId) -> Endpoint<FollowStats> {
    Endpoint::get(format!("/follow/stats/{user_id}"))
}

pub fn followers(user_id: UserId, page: Page) -> Endpoint<Vec<Follow>> {
    Endpoint::get(format!("/follow/followers/{user_id}?{page}"))
}

pub fn following(user_id: UserId, page: Page) -> Endpoint<Vec<Follow>> {
    Endpoint::get(format!("/follow/following/{user_id}?{page}"))
}

pub fn my_followers(page: Page) -> Endpoint<Vec<Follow>> {
    Endpoint::get(format!("/follow/my-followers?{page}"))
}

pub fn my_following(page: Page) -> Endpoint<Vec<Follow>> {
    Endpoint::get(format!("/follow/my-following?{page}"))
}

//! Cached reads: each function pairs a `QueryKey` with the endpoint that
//! fills it.
//!
//! Lists use their resource's default page; the key does not carry the page,
//! so one key always holds the first page of its list.

use crate::api::{self, Endpoint};
use crate::cache::QueryKey;
use crate::types::{
    Comment, Follow, FollowStats, Like, LikeStatus, Post, PostId, Story, StoryId, User, UserId,
};

#[derive(Debug, Clone)]
pub struct Query<V> {
    pub key: QueryKey,
    pub endpoint: Endpoint<V>,
    /// Refuse to fetch unless the session is authenticated.
    pub requires_auth: bool,
}

impl<V> Query<V> {
    pub fn new(key: QueryKey, endpoint: Endpoint<V>) -> Self {
        Self {
            key,
            endpoint,
            requires_auth: true,
        }
    }

    /// Allow fetching without a signed-in session.
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }
}

pub fn posts() -> Query<Vec<Post>> {
    Query::new(QueryKey::Posts, api::posts::list(api::posts::DEFAULT_PAGE))
}

pub fn post(id: PostId) -> Query<Post> {
    Query::new(QueryKey::Post(id), api::posts::get(id))
}

pub fn user_posts(user_id: UserId) -> Query<Vec<Post>> {
    Query::new(
        QueryKey::UserPosts(user_id),
        api::posts::list_by_user(user_id, api::posts::DEFAULT_PAGE),
    )
}

pub fn my_posts() -> Query<Vec<Post>> {
    Query::new(QueryKey::MyPosts, api::posts::list_mine(api::posts::DEFAULT_PAGE))
}

pub fn post_comments(post_id: PostId) -> Query<Vec<Comment>> {
    Query::new(
        QueryKey::PostComments(post_id),
        api::comments::list_by_post(post_id, api::comments::DEFAULT_PAGE),
    )
}

pub fn my_comments() -> Query<Vec<Comment>> {
    Query::new(
        QueryKey::MyComments,
        api::comments::list_mine(api::comments::DEFAULT_PAGE),
    )
}

/// Like count and whether the current user liked the post.
pub fn post_likes(post_id: PostId) -> Query<LikeStatus> {
    Query::new(QueryKey::PostLikes(post_id), api::likes::status(post_id))
}

pub fn post_likers(post_id: PostId) -> Query<Vec<Like>> {
    Query::new(
        QueryKey::PostLikers(post_id),
        api::likes::list_by_post(post_id, api::likes::DEFAULT_PAGE),
    )
}

pub fn my_likes() -> Query<Vec<Like>> {
    Query::new(QueryKey::MyLikes, api::likes::list_mine(api::likes::DEFAULT_PAGE))
}

pub fn me() -> Query<User> {
    Query::new(QueryKey::Me, api::users::me())
}

pub fn user(id: UserId) -> Query<User> {
    Query::new(QueryKey::User(id), api::users::get(id))
}

pub fn all_users() -> Query<Vec<User>> {
    Query::new(QueryKey::AllUsers, api::users::all())
}

pub fn follow_stats(user_id: UserId) -> Query<FollowStats> {
    Query::new(QueryKey::FollowStats(user_id), api::follows::stats(user_id))
}

pub fn followers(user_id: UserId) -> Query<Vec<Follow>> {
    Query::new(
        QueryKey::Followers(user_id),
        api::follows::followers(user_id, api::follows::DEFAULT_PAGE),
    )
}

pub fn following(user_id: UserId) -> Query<Vec<Follow>> {
    Query::new(
        QueryKey::Following(user_id),
        api::follows::following(user_id, api::follows::DEFAULT_PAGE),
    )
}

pub fn my_followers() -> Query<Vec<Follow>> {
    Query::new(
        QueryKey::MyFollowers,
        api::follows::my_followers(api::follows::DEFAULT_PAGE),
    )
}

pub fn my_following() -> Query<Vec<Follow>> {
    Query::new(
        QueryKey::MyFollowing,
        api::follows::my_following(api::follows::DEFAULT_PAGE),
    )
}

/// Unexpired stories of everyone. The server drops expired ones.
pub fn active_stories() -> Query<Vec<Story>> {
    Query::new(
        QueryKey::ActiveStories,
        api::stories::list_active(api::stories::ACTIVE_PAGE),
    )
}

pub fn user_stories(user_id: UserId) -> Query<Vec<Story>> {
    Query::new(
        QueryKey::UserStories(user_id),
        api::stories::list_by_user(user_id, api::stories::DEFAULT_PAGE),
    )
}

pub fn my_stories() -> Query<Vec<Story>> {
    Query::new(
        QueryKey::MyStories,
        api::stories::list_mine(api::stories::DEFAULT_PAGE),
    )
}

pub fn story(id: StoryId) -> Query<Story> {
    Query::new(QueryKey::Story(id), api::stories::get(id))
}

//! Writes and the cache keys each one invalidates on success.
//!
//! The invalidation set is part of the mutation's value, so what a write
//! refreshes can be read (and tested) without running it.

use crate::api::{self, Endpoint};
use crate::cache::QueryKey;
use crate::error::ApiError;
use crate::http::FileUpload;
use crate::types::{
    Comment, CommentId, CommentInput, Message, PasswordUpdate, Post, PostId, PostInput,
    ProfileUpdate, Story, StoryId, ToggleLike, Upload, User, UserId,
};

#[derive(Debug, Clone)]
pub struct Mutation<V> {
    pub endpoint: Endpoint<V>,
    pub invalidates: Vec<QueryKey>,
    /// Report failures (other than validation) to the ambient notifier.
    pub ambient_errors: bool,
}

impl<V> Mutation<V> {
    pub fn new(endpoint: Endpoint<V>, invalidates: Vec<QueryKey>) -> Self {
        Self {
            endpoint,
            invalidates,
            ambient_errors: true,
        }
    }

    /// Leave error reporting to the caller.
    pub fn quiet(mut self) -> Self {
        self.ambient_errors = false;
        self
    }
}

pub fn create_post(content: &str) -> Result<Mutation<Post>, ApiError> {
    Ok(Mutation::new(
        api::posts::create(content)?,
        vec![QueryKey::Posts, QueryKey::MyPosts],
    ))
}

pub fn update_post(id: PostId, content: &str) -> Result<Mutation<Post>, ApiError> {
    let input = PostInput {
        content: content.to_string(),
    };
    Ok(Mutation::new(
        api::posts::update(id, &input)?,
        vec![QueryKey::Posts, QueryKey::MyPosts, QueryKey::Post(id)],
    ))
}

pub fn delete_post(id: PostId) -> Mutation<Message> {
    Mutation::new(
        api::posts::delete(id),
        vec![QueryKey::Posts, QueryKey::MyPosts, QueryKey::Post(id)],
    )
}

/// Touches the comment list of `post_id` and nothing else.
pub fn create_comment(post_id: PostId, content: &str) -> Result<Mutation<Comment>, ApiError> {
    Ok(Mutation::new(
        api::comments::create(post_id, content)?,
        vec![QueryKey::PostComments(post_id)],
    ))
}

pub fn update_comment(
    post_id: PostId,
    id: CommentId,
    content: &str,
) -> Result<Mutation<Comment>, ApiError> {
    let input = CommentInput {
        content: content.to_string(),
    };
    Ok(Mutation::new(
        api::comments::update(id, &input)?,
        vec![QueryKey::PostComments(post_id), QueryKey::MyComments],
    ))
}

pub fn delete_comment(post_id: PostId, id: CommentId) -> Mutation<Message> {
    Mutation::new(
        api::comments::delete(id),
        vec![QueryKey::PostComments(post_id), QueryKey::MyComments],
    )
}

/// Flip the current user's like. The refetched aggregate is authoritative;
/// two racing toggles end at whatever the server answered last.
pub fn toggle_like(post_id: PostId) -> Mutation<ToggleLike> {
    Mutation::new(api::likes::toggle(post_id), vec![QueryKey::PostLikes(post_id)])
}

pub fn follow(user_id: UserId) -> Mutation<Message> {
    Mutation::new(api::follows::follow(user_id), follow_keys(user_id))
}

pub fn unfollow(user_id: UserId) -> Mutation<Message> {
    Mutation::new(api::follows::unfollow(user_id), follow_keys(user_id))
}

fn follow_keys(user_id: UserId) -> Vec<QueryKey> {
    vec![
        QueryKey::FollowStats(user_id),
        QueryKey::Followers(user_id),
        QueryKey::MyFollowing,
    ]
}

pub fn create_story(content_url: &str) -> Result<Mutation<Story>, ApiError> {
    Ok(Mutation::new(
        api::stories::create(content_url)?,
        vec![QueryKey::ActiveStories, QueryKey::MyStories],
    ))
}

pub fn delete_story(id: StoryId) -> Mutation<Message> {
    Mutation::new(
        api::stories::delete(id),
        vec![QueryKey::ActiveStories, QueryKey::MyStories, QueryKey::Story(id)],
    )
}

pub fn upload_image(file: &FileUpload) -> Mutation<Upload> {
    Mutation::new(api::uploads::image(file), Vec::new())
}

pub fn upload_video(file: &FileUpload) -> Mutation<Upload> {
    Mutation::new(api::uploads::video(file), Vec::new())
}

pub fn update_password(update: &PasswordUpdate) -> Result<Mutation<Message>, ApiError> {
    Ok(Mutation::new(api::users::update_password(update)?, Vec::new()))
}

/// Profile writes refresh both views of the signed-in user.
pub fn update_profile(user_id: Option<UserId>, update: &ProfileUpdate) -> Result<Mutation<User>, ApiError> {
    Ok(Mutation::new(api::users::update_me(update)?, profile_keys(user_id)))
}

pub fn upload_profile_picture(user_id: Option<UserId>, file: &FileUpload) -> Mutation<Upload> {
    Mutation::new(api::uploads::profile_picture(file), profile_keys(user_id))
}

pub fn delete_account() -> Mutation<Message> {
    Mutation::new(api::users::delete_me(), Vec::new())
}

fn profile_keys(user_id: Option<UserId>) -> Vec<QueryKey> {
    let mut keys = vec![QueryKey::Me];
    keys.extend(user_id.map(QueryKey::User));
    keys
}

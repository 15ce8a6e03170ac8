//! Route table. Static segments (`/posts/me`, `/users/all`) sit next to
//! `{id}` captures; the router prefers the static match.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::store::Db;

pub mod auth;
pub mod comments;
pub mod follows;
pub mod health;
pub mod likes;
pub mod posts;
pub mod stories;
pub mod uploads;
pub mod users;

pub fn router() -> Router<Db> {
    Router::new()
        .route("/health", get(health::check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users/all", get(users::all))
        .route("/users/me", get(users::me).put(users::update_me).delete(users::delete_me))
        .route("/users/password", put(users::update_password))
        .route("/users/{id}", get(users::get))
        .route("/posts/", get(posts::list_all).post(posts::create))
        .route("/posts/me", get(posts::list_mine))
        .route("/posts/user/{user_id}", get(posts::list_by_user))
        .route("/posts/{id}", get(posts::get).put(posts::update).delete(posts::delete))
        .route("/comments/me", get(comments::list_mine))
        .route(
            "/comments/post/{post_id}",
            get(comments::list_by_post).post(comments::create),
        )
        .route("/comments/{id}", put(comments::update).delete(comments::delete))
        .route("/likes/me", get(likes::list_mine))
        .route("/likes/post/{post_id}", get(likes::list_by_post).post(likes::toggle))
        .route("/likes/post/{post_id}/count", get(likes::count))
        .route("/follow/my-followers", get(follows::my_followers))
        .route("/follow/my-following", get(follows::my_following))
        .route("/follow/stats/{user_id}", get(follows::stats))
        .route("/follow/followers/{user_id}", get(follows::followers))
        .route("/follow/following/{user_id}", get(follows::following))
        .route("/follow/{user_id}", post(follows::follow).delete(follows::unfollow))
        .route("/stories/", get(stories::list_active).post(stories::create))
        .route("/stories/me", get(stories::list_mine))
        .route("/stories/cleanup", post(stories::cleanup))
        .route("/stories/user/{user_id}", get(stories::list_by_user))
        .route("/stories/{id}", get(stories::get).delete(stories::delete))
        .route("/upload/image", post(uploads::image))
        .route("/upload/video", post(uploads::video))
        .route("/upload/profile-picture", post(uploads::profile_picture))
        .route("/upload/{kind}/{filename}", get(uploads::fetch))
}

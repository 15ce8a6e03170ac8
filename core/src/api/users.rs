//! `/users`: the signed-in profile and other accounts.

use super::Endpoint;
use crate::error::ApiError;
use crate::types::{Message, PasswordUpdate, ProfileUpdate, User, UserId};

pub fn me() -> Endpoint<User> {
    Endpoint::get("/users/me")
}

pub fn get(id: UserId) -> Endpoint<User> {
    Endpoint::get(format!("/users/{id}"))
}

pub fn all() -> Endpoint<Vec<User>> {
    Endpoint::get("/users/all")
}

pub fn update_me(update: &ProfileUpdate) -> Result<Endpoint<User>, ApiError> {
    Endpoint::put_json("/users/me", update)
}

pub fn update_password(update: &PasswordUpdate) -> Result<Endpoint<Message>, ApiError> {
    Endpoint::put_json("/users/password", update)
}

pub fn delete_me() -> Endpoint<Message> {
    Endpoint::delete("/users/me")
}

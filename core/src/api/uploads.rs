//! `/upload`: the file goes up as a multipart part named `file`; the reply
//! carries the URL the server assigned.

use super::Endpoint;
use crate::http::{FileUpload, Multipart};
use crate::types::Upload;

fn upload(path: &str, file: &FileUpload) -> Endpoint<Upload> {
    Endpoint::post_form(path, Multipart::new().file("file", file))
}

pub fn image(file: &FileUpload) -> Endpoint<Upload> {
    upload("/upload/image", file)
}

pub fn video(file: &FileUpload) -> Endpoint<Upload> {
    upload("/upload/video", file)
}

/// The server also stores the URL as the caller's profile picture.
pub fn profile_picture(file: &FileUpload) -> Endpoint<Upload> {
    upload("/upload/profile-picture", file)
}

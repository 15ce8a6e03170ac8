use std::path::Path as FsPath;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{CurrentUser, FilePart, Form};
use crate::store::Db;

const MB: usize = 1024 * 1024;
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv"];

/// Per-endpoint upload rules.
struct Rules {
    dir: &'static str,
    extensions: &'static [&'static str],
    max_bytes: usize,
    type_error: &'static str,
    done: &'static str,
}

const IMAGE: Rules = Rules {
    dir: "images",
    extensions: IMAGE_EXTENSIONS,
    max_bytes: 5 * MB,
    type_error: "Invalid file type. Only images are allowed (jpg, jpeg, png, gif, webp)",
    done: "Image uploaded successfully",
};

const VIDEO: Rules = Rules {
    dir: "videos",
    extensions: VIDEO_EXTENSIONS,
    max_bytes: 50 * MB,
    type_error: "Invalid file type. Only videos are allowed (mp4, avi, mov, wmv, flv)",
    done: "Video uploaded successfully",
};

const PROFILE: Rules = Rules {
    dir: "profiles",
    extensions: IMAGE_EXTENSIONS,
    max_bytes: 2 * MB,
    type_error: "Invalid file type. Only images are allowed (jpg, jpeg, png, gif, webp)",
    done: "Profile picture updated successfully",
};

fn extension(filename: &str) -> Option<String> {
    FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Check `file` against `rules` and return its lowercased extension.
fn validate(rules: &Rules, file: &FilePart) -> Result<String, AppError> {
    let ext = extension(&file.filename)
        .filter(|e| rules.extensions.contains(&e.as_str()))
        .ok_or_else(|| AppError::BadRequest(rules.type_error.into()))?;
    if file.bytes.len() > rules.max_bytes {
        return Err(AppError::BadRequest(format!(
            "File size too large. Maximum {}MB allowed",
            rules.max_bytes / MB
        )));
    }
    Ok(ext)
}

async fn save(db: &Db, rules: &Rules, prefix: &str, file: &FilePart) -> Result<(String, Value), AppError> {
    let ext = validate(rules, file)?;
    let filename = format!("{prefix}{}.{ext}", Uuid::new_v4());
    let url = format!("/uploads/{}/{filename}", rules.dir);
    let body = json!({ "message": rules.done, "file_url": url, "filename": filename });
    db.write().await.save_file(url.clone(), file.bytes.clone());
    info!(%url, bytes = file.bytes.len(), "file stored");
    Ok((url, body))
}

pub async fn image(State(db): State<Db>, _: CurrentUser, form: Form) -> Result<Json<Value>, AppError> {
    let (_, body) = save(&db, &IMAGE, "", form.file("file")?).await?;
    Ok(Json(body))
}

pub async fn video(State(db): State<Db>, _: CurrentUser, form: Form) -> Result<Json<Value>, AppError> {
    let (_, body) = save(&db, &VIDEO, "", form.file("file")?).await?;
    Ok(Json(body))
}

/// Stores the picture and points the caller's profile at it.
pub async fn profile_picture(
    State(db): State<Db>,
    CurrentUser(me): CurrentUser,
    form: Form,
) -> Result<Json<Value>, AppError> {
    let prefix = format!("profile_{me}_");
    let (url, body) = save(&db, &PROFILE, &prefix, form.file("file")?).await?;
    if let Some(user) = db.write().await.users.get_mut(me) {
        user.profile_pic = Some(url);
    }
    Ok(Json(body))
}

/// GET /upload/{kind}/{filename}
pub async fn fetch(
    State(db): State<Db>,
    Path((kind, filename)): Path<(String, String)>,
) -> Result<Vec<u8>, AppError> {
    let url = format!("/uploads/{kind}/{filename}");
    db.read()
        .await
        .file(&url)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}

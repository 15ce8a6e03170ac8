//! End-to-end run against the live mock server over real HTTP.
//!
//! # Design
//! The server runs on its own runtime in a background thread, bound to a
//! random port. Tests drive `AppContext` with the production `UreqTransport`,
//! so request building, the interceptors, parsing and cache invalidation are
//! all exercised together. The server's store is shared with the test to seed
//! rows the API cannot create (an already expired story) and to revoke
//! sessions.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{CountingNavigator, CountingNotifier};
use mock_server::{Db, Store};
use social_core::types::RegisterUser;
use social_core::{
    mutation, query, ApiError, AppContext, ClientConfig, FileUpload, QueryKey, QueryOptions,
    RegisterOutcome, SessionStatus, StoryExpiry, UreqTransport,
};

/// Start the mock server and return its base URL and store.
fn start_server() -> (String, Db) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let db = Store::new_db();
    let server_db = db.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_db(listener, server_db).await
        })
    });

    (format!("http://{addr}"), db)
}

struct Client {
    ctx: AppContext<UreqTransport>,
    navigator: Arc<CountingNavigator>,
    notifier: Arc<CountingNotifier>,
}

fn client(config: ClientConfig) -> Client {
    let navigator = Arc::new(CountingNavigator::default());
    let notifier = Arc::new(CountingNotifier::default());
    let ctx = AppContext::builder(UreqTransport::new())
        .config(config)
        .navigator(navigator.clone())
        .notifier(notifier.clone())
        .build();
    Client {
        ctx,
        navigator,
        notifier,
    }
}

fn account(username: &str) -> RegisterUser {
    RegisterUser {
        name: username.to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "Secret123".to_string(),
        ..Default::default()
    }
}

/// Register `username` and log them in.
async fn signed_up(config: ClientConfig, username: &str) -> Client {
    let client = client(config);
    let outcome = client.ctx.register(&account(username)).await.unwrap();
    assert!(matches!(outcome, RegisterOutcome::Created(ref u) if u.username == username));
    assert!(!client.ctx.session().is_authenticated());

    let user = client
        .ctx
        .login(&format!("{username}@example.com"), "Secret123")
        .await
        .unwrap();
    assert_eq!(user.username, username);
    assert_eq!(client.ctx.session().status(), SessionStatus::Authenticated);
    client
}

#[tokio::test(flavor = "multi_thread")]
async fn social_lifecycle() {
    let (base_url, _db) = start_server();
    let ann = signed_up(ClientConfig::new(&base_url), "ann").await;
    let bob = signed_up(ClientConfig::new(&base_url), "bob").await;
    let ctx = &ann.ctx;

    // Posts: the observed feed is refetched by the create itself.
    let _feed = ctx.subscribe(QueryKey::Posts);
    let feed = ctx.fetch(&query::posts(), QueryOptions::default()).await;
    assert_eq!(feed.data().unwrap().len(), 0);

    let post = ctx
        .mutate(&mutation::create_post("hello world").unwrap())
        .await
        .unwrap();
    assert!(!ctx.cache().is_stale(&QueryKey::Posts));
    let feed = ctx.fetch(&query::posts(), QueryOptions::default()).await;
    let posts = feed.data().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content, "hello world");
    assert_eq!(posts[0].author_id(), Some(ctx.session().current_user_id().unwrap()));

    // Likes
    let _likes = ctx.subscribe(QueryKey::PostLikes(post.id));
    let status = ctx.fetch(&query::post_likes(post.id), QueryOptions::default()).await;
    assert_eq!(status.data().unwrap().likes_count, 0);
    let toggled = bob.ctx.mutate(&mutation::toggle_like(post.id)).await.unwrap();
    assert!(toggled.liked);
    ctx.mutate(&mutation::toggle_like(post.id)).await.unwrap();
    let status = ctx.fetch(&query::post_likes(post.id), QueryOptions::default()).await;
    let status = status.data().unwrap();
    assert_eq!(status.likes_count, 2);
    assert!(status.user_liked);

    // Comments
    bob.ctx
        .mutate(&mutation::create_comment(post.id, "nice").unwrap())
        .await
        .unwrap();
    let comments = ctx
        .fetch(&query::post_comments(post.id), QueryOptions::default())
        .await;
    let comments = comments.data().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].user.as_ref().unwrap().username, "bob");

    // Follows
    let bob_id = bob.ctx.session().current_user_id().unwrap();
    let _stats = ctx.subscribe(QueryKey::FollowStats(bob_id));
    let stats = ctx.fetch(&query::follow_stats(bob_id), QueryOptions::default()).await;
    assert_eq!(stats.data().unwrap().followers_count, 0);
    ctx.mutate(&mutation::follow(bob_id)).await.unwrap();
    let stats = ctx.fetch(&query::follow_stats(bob_id), QueryOptions::default()).await;
    assert_eq!(stats.data().unwrap().followers_count, 1);
    assert!(stats.data().unwrap().is_following);

    let again = ctx.mutate(&mutation::follow(bob_id)).await.unwrap_err();
    assert_eq!(again.to_string(), "You are already following this user");
    assert_eq!(ann.notifier.notified(), vec![again]);

    // Non-owners cannot edit.
    let err = bob
        .ctx
        .mutate(&mutation::update_post(post.id, "mine").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(bob.navigator.redirects(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn validation_errors_stay_local() {
    let (base_url, _db) = start_server();
    let ann = client(ClientConfig::new(&base_url));
    let mut short = account("ann");
    short.password = "short".to_string();

    let err = ann.ctx.register(&short).await.unwrap_err();
    match err {
        ApiError::Validation { issues, .. } => {
            assert_eq!(issues[0].loc, vec!["body", "password"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(ann.notifier.notified().is_empty());

    let err = ann.ctx.login("ann@example.com", "Secret123").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[tokio::test(flavor = "multi_thread")]
async fn stories_and_uploads() {
    let (base_url, db) = start_server();
    let ann = signed_up(ClientConfig::new(&base_url), "ann").await;
    let ctx = &ann.ctx;
    let me = ctx.session().current_user_id().unwrap();

    let upload = ctx
        .mutate(&mutation::upload_image(&FileUpload::new("cat.png", b"png".to_vec())))
        .await
        .unwrap();
    assert!(upload.file_url.starts_with("/uploads/images/"));

    let live = ctx
        .mutate(&mutation::create_story(&upload.file_url).unwrap())
        .await
        .unwrap();
    let expired = db
        .write()
        .await
        .add_story(me, "/uploads/images/old.png", Utc::now() - Duration::hours(1));

    let active = ctx.fetch(&query::active_stories(), QueryOptions::default()).await;
    let ids: Vec<i64> = active.data().unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![live.id]);

    let now = Utc::now();
    let old = ctx.fetch(&query::story(expired), QueryOptions::default()).await;
    assert_eq!(old.data().unwrap().expiry(now), StoryExpiry::Expired);
    assert!(matches!(live.expiry(now), StoryExpiry::Remaining { hours: 23 }));

    let picture = ctx
        .upload_profile_picture(&FileUpload::new("me.jpg", vec![1; 32]))
        .await
        .unwrap();
    assert_eq!(
        ctx.session().current_user().unwrap().profile_pic.as_deref(),
        Some(picture.file_url.as_str())
    );
    // the session user is the server's copy, also cached under `Me`
    let cached = ctx.fetch(&query::me(), QueryOptions::default()).await;
    assert_eq!(cached.data(), ctx.session().current_user().as_ref());
}

#[tokio::test(flavor = "multi_thread")]
async fn persisted_token_survives_restart_until_revoked() {
    let (base_url, db) = start_server();
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::new(&base_url).with_token_path(dir.path().join("token"));

    let first = signed_up(config.clone(), "ann").await;
    first.ctx.fetch(&query::my_posts(), QueryOptions::default()).await;

    let restarted = client(config.clone());
    assert_eq!(restarted.ctx.init().await, SessionStatus::Authenticated);
    assert_eq!(restarted.ctx.session().current_user().unwrap().username, "ann");

    db.write().await.revoke_sessions();

    let result = restarted
        .ctx
        .fetch(&query::my_posts(), QueryOptions::default())
        .await;
    assert!(result.error.unwrap().is_unauthorized());
    assert_eq!(restarted.ctx.session().status(), SessionStatus::Anonymous);
    assert_eq!(restarted.navigator.redirects(), 1);
    assert!(!dir.path().join("token").exists());

    let fresh = client(config);
    assert_eq!(fresh.ctx.init().await, SessionStatus::Anonymous);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_account_logs_out() {
    let (base_url, db) = start_server();
    let ann = signed_up(ClientConfig::new(&base_url), "ann").await;

    let message = ann.ctx.delete_account().await.unwrap();
    assert_eq!(message.message, "Account deleted successfully");
    assert_eq!(ann.ctx.session().status(), SessionStatus::Anonymous);
    assert!(db.read().await.find_by_email("ann@example.com").is_none());
}

//! In-memory tables and the JSON views handlers return.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type Db = Arc<RwLock<Store>>;

/// How long a new story stays in the active lists.
pub const STORY_LIFETIME_HOURS: i64 = 24;

/// Rows keyed by an auto-incrementing id starting at 1.
#[derive(Debug)]
pub struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    pub fn insert(&mut self, build: impl FnOnce(i64) -> T) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, build(id));
        id
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.rows.retain(|_, row| keep(row));
    }
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PostRecord {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LikeRecord {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowRecord {
    pub id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoryRecord {
    pub id: i64,
    pub user_id: i64,
    pub content_url: String,
    pub created_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
    pub is_active: bool,
}

impl StoryRecord {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expire_at > now
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            bio: user.bio.clone(),
            profile_pic: user.profile_pic.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub creator: UserView,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct LikeView {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct StoryView {
    pub id: i64,
    pub content_url: String,
    pub created_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
    pub is_active: bool,
    pub user: UserView,
}

/// New account fields after form validation.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub users: Table<UserRecord>,
    pub posts: Table<PostRecord>,
    pub comments: Table<CommentRecord>,
    pub likes: Table<LikeRecord>,
    pub follows: Table<FollowRecord>,
    pub stories: Table<StoryRecord>,
    sessions: HashMap<String, i64>,
    files: HashMap<String, Vec<u8>>,
}

impl Store {
    pub fn new_db() -> Db {
        Arc::new(RwLock::new(Store::default()))
    }

    // --- users & sessions ---

    pub fn add_user(&mut self, new: NewUser) -> i64 {
        self.users.insert(|id| UserRecord {
            id,
            name: new.name,
            username: new.username,
            email: new.email,
            password: new.password,
            phone: new.phone,
            address: new.address,
            bio: new.bio,
            profile_pic: new.profile_pic,
            is_active: true,
            created_at: Utc::now(),
        })
    }

    pub fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users.values().find(|u| u.email == email)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&UserRecord> {
        self.users.values().find(|u| u.username == username)
    }

    pub fn user_view(&self, id: i64) -> Option<UserView> {
        self.users.get(id).map(UserView::from)
    }

    /// Issue a fresh bearer token for `user_id`.
    pub fn open_session(&mut self, user_id: i64) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user_id);
        token
    }

    pub fn session_user(&self, token: &str) -> Option<i64> {
        self.sessions
            .get(token)
            .copied()
            .filter(|id| self.users.get(*id).is_some())
    }

    /// Invalidate every issued token.
    pub fn revoke_sessions(&mut self) {
        self.sessions.clear();
    }

    /// Remove a user and everything they own or touched.
    pub fn delete_user(&mut self, id: i64) {
        self.users.remove(id);
        let owned_posts: Vec<i64> = self
            .posts
            .values()
            .filter(|p| p.user_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned_posts {
            self.delete_post(post_id);
        }
        self.comments.retain(|c| c.user_id != id);
        self.likes.retain(|l| l.user_id != id);
        self.stories.retain(|s| s.user_id != id);
        self.follows
            .retain(|f| f.follower_id != id && f.following_id != id);
        self.sessions.retain(|_, user| *user != id);
    }

    // --- posts ---

    pub fn delete_post(&mut self, id: i64) {
        self.posts.remove(id);
        self.comments.retain(|c| c.post_id != id);
        self.likes.retain(|l| l.post_id != id);
    }

    pub fn post_view(&self, post: &PostRecord) -> Option<PostView> {
        Some(PostView {
            id: post.id,
            content: post.content.clone(),
            created_at: post.created_at,
            creator: self.user_view(post.user_id)?,
        })
    }

    pub fn comment_view(&self, comment: &CommentRecord) -> Option<CommentView> {
        Some(CommentView {
            id: comment.id,
            content: comment.content.clone(),
            created_at: comment.created_at,
            user: self.user_view(comment.user_id)?,
        })
    }

    pub fn like_view(&self, like: &LikeRecord) -> Option<LikeView> {
        Some(LikeView {
            id: like.id,
            created_at: like.created_at,
            user: self.user_view(like.user_id)?,
        })
    }

    // --- follows ---

    pub fn follow_edge(&self, follower_id: i64, following_id: i64) -> Option<&FollowRecord> {
        self.follows
            .values()
            .find(|f| f.follower_id == follower_id && f.following_id == following_id)
    }

    // --- stories ---

    /// Insert a story with an explicit expiry.
    pub fn add_story(&mut self, user_id: i64, content_url: &str, expire_at: DateTime<Utc>) -> i64 {
        let created_at = expire_at - Duration::hours(STORY_LIFETIME_HOURS);
        self.stories.insert(|id| StoryRecord {
            id,
            user_id,
            content_url: content_url.to_string(),
            created_at,
            expire_at,
            is_active: true,
        })
    }

    // --- uploads ---

    pub fn save_file(&mut self, url: String, bytes: Vec<u8>) {
        self.files.insert(url, bytes);
    }

    pub fn file(&self, url: &str) -> Option<&[u8]> {
        self.files.get(url).map(Vec::as_slice)
    }

    pub fn story_view(&self, story: &StoryRecord) -> Option<StoryView> {
        Some(StoryView {
            id: story.id,
            content_url: story.content_url.clone(),
            created_at: story.created_at,
            expire_at: story.expire_at,
            is_active: story.is_active,
            user: self.user_view(story.user_id)?,
        })
    }
}

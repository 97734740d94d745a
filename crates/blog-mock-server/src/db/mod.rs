//! In-memory storage backing the mock service.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use blog_shared::{Comment, CommentId, Post, PostId, UserId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::auth::AuthUser;
use crate::error::AppError;

pub type DbPool = Arc<Mutex<Db>>;

/// Endpoints that can be counted, failed or slowed down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    ListPosts,
    GetPost,
    CreatePost,
    UpdatePost,
    DeletePost,
    UserPosts,
    ListComments,
    CreateComment,
    DeleteComment,
    UserComments,
    ToggleLike,
}

#[derive(Debug)]
struct UserRow {
    id: UserId,
    username: String,
    token: String,
}

#[derive(Debug)]
struct PostRow {
    id: PostId,
    title: String,
    description: String,
    author_id: UserId,
    created_at: DateTime<Utc>,
    likes: BTreeSet<UserId>,
}

#[derive(Debug, Default)]
pub struct Db {
    users: Vec<UserRow>,
    posts: BTreeMap<PostId, PostRow>,
    /// Flat, in creation order
    comments: Vec<Comment>,
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
    nested_comments: bool,
    requests: HashMap<Route, usize>,
    faults: HashMap<Route, u32>,
    delays: HashMap<Route, Duration>,
}

impl Db {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_pool(self) -> DbPool {
        Arc::new(Mutex::new(self))
    }

    /// Serve comment lists as roots with nested replies, newest root first.
    pub fn set_nested_comments(&mut self, nested: bool) {
        self.nested_comments = nested;
    }

    // ============ Seeding ============

    pub fn add_user(&mut self, username: &str, token: &str) -> UserId {
        self.next_user_id += 1;
        let id = UserId(self.next_user_id);
        self.users.push(UserRow {
            id,
            username: username.to_string(),
            token: token.to_string(),
        });
        id
    }

    pub fn add_post(&mut self, author_id: UserId, title: &str, description: &str) -> PostId {
        self.next_post_id += 1;
        let id = PostId(self.next_post_id);
        self.posts.insert(
            id,
            PostRow {
                id,
                title: title.to_string(),
                description: description.to_string(),
                author_id,
                created_at: Utc::now(),
                likes: BTreeSet::new(),
            },
        );
        id
    }

    /// Insert a comment without validation, so tests can build any shape.
    pub fn add_comment(
        &mut self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> CommentId {
        self.next_comment_id += 1;
        let id = CommentId(self.next_comment_id);
        let now = Utc::now();
        let author_username = self.username(author_id).unwrap_or_default().to_string();
        self.comments.push(Comment {
            id,
            content: content.to_string(),
            author_id,
            author_username,
            post_id,
            parent_id,
            created_at: now,
            updated_at: now,
            replies: Vec::new(),
        });
        id
    }

    pub fn like(&mut self, post_id: PostId, user_id: UserId) {
        if let Some(post) = self.posts.get_mut(&post_id) {
            post.likes.insert(user_id);
        }
    }

    // ============ Inspection and fault injection ============

    /// How many requests reached `route`, failed ones included.
    pub fn requests(&self, route: Route) -> usize {
        self.requests.get(&route).copied().unwrap_or(0)
    }

    /// Answer the next `times` requests to `route` with a 500.
    pub fn fail_next(&mut self, route: Route, times: u32) {
        self.faults.insert(route, times);
    }

    /// Hold every request to `route` for `delay` before handling it.
    pub fn delay(&mut self, route: Route, delay: Duration) {
        self.delays.insert(route, delay);
    }

    pub fn comment_count(&self, post_id: PostId) -> usize {
        self.comments.iter().filter(|c| c.post_id == post_id).count()
    }

    pub fn like_count(&self, post_id: PostId) -> usize {
        self.posts.get(&post_id).map(|p| p.likes.len()).unwrap_or(0)
    }

    /// Count a request and apply any injected fault. Returns the delay to
    /// wait before handling it.
    pub(crate) fn record(&mut self, route: Route) -> Result<Option<Duration>, AppError> {
        *self.requests.entry(route).or_default() += 1;

        if let Some(remaining) = self.faults.get_mut(&route) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AppError::Injected);
            }
        }

        Ok(self.delays.get(&route).copied())
    }

    // ============ Users ============

    pub(crate) fn user_by_token(&self, token: &str) -> Option<AuthUser> {
        self.users
            .iter()
            .find(|u| u.token == token)
            .map(|u| AuthUser {
                id: u.id,
                username: u.username.clone(),
            })
    }

    fn username(&self, id: UserId) -> Option<&str> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.as_str())
    }

    fn user_id(&self, username: &str) -> Option<UserId> {
        self.users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.id)
    }

    // ============ Posts ============

    fn post_view(&self, row: &PostRow, viewer: Option<UserId>) -> Post {
        Post {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            author: self.username(row.author_id).unwrap_or_default().to_string(),
            like_count: row.likes.len() as u64,
            liked_by_user: viewer.map_or(false, |v| row.likes.contains(&v)),
            created_at: Some(row.created_at),
        }
    }

    /// Newest first
    pub(crate) fn list_posts(&self, viewer: Option<UserId>) -> Vec<Post> {
        self.posts
            .values()
            .rev()
            .map(|row| self.post_view(row, viewer))
            .collect()
    }

    pub(crate) fn get_post(&self, id: PostId, viewer: Option<UserId>) -> Result<Post, AppError> {
        let row = self.posts.get(&id).ok_or(AppError::NotFound)?;
        Ok(self.post_view(row, viewer))
    }

    pub(crate) fn posts_by(&self, username: &str) -> Result<Vec<Post>, AppError> {
        let author = self.user_id(username).ok_or(AppError::NotFound)?;
        Ok(self
            .posts
            .values()
            .filter(|row| row.author_id == author)
            .map(|row| self.post_view(row, None))
            .collect())
    }

    pub(crate) fn update_post(
        &mut self,
        id: PostId,
        user: &AuthUser,
        title: String,
        description: String,
    ) -> Result<Post, AppError> {
        let row = self.posts.get_mut(&id).ok_or(AppError::NotFound)?;
        if row.author_id != user.id {
            return Err(AppError::Forbidden);
        }
        row.title = title;
        row.description = description;
        self.get_post(id, Some(user.id))
    }

    /// Removes the post and, like the real service, its comments.
    pub(crate) fn delete_post(&mut self, id: PostId, user: &AuthUser) -> Result<(), AppError> {
        let row = self.posts.get(&id).ok_or(AppError::NotFound)?;
        if row.author_id != user.id {
            return Err(AppError::Forbidden);
        }
        self.posts.remove(&id);
        self.comments.retain(|c| c.post_id != id);
        Ok(())
    }

    // ============ Comments ============

    pub(crate) fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, AppError> {
        if !self.posts.contains_key(&post_id) {
            return Err(AppError::NotFound);
        }

        let flat = self.comments.iter().filter(|c| c.post_id == post_id);
        if !self.nested_comments {
            return Ok(flat.cloned().collect());
        }

        let mut roots: Vec<Comment> = flat
            .clone()
            .filter(|c| c.parent_id.is_none())
            .cloned()
            .collect();
        for root in &mut roots {
            let root_id = root.id;
            root.replies = flat
                .clone()
                .filter(|c| c.parent_id == Some(root_id))
                .cloned()
                .collect();
        }
        roots.reverse();
        Ok(roots)
    }

    pub(crate) fn create_comment(
        &mut self,
        post_id: PostId,
        user: &AuthUser,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> Result<Comment, AppError> {
        if !self.posts.contains_key(&post_id) {
            return Err(AppError::NotFound);
        }
        if content.trim().is_empty() {
            return Err(AppError::Validation("Comment content is required".to_string()));
        }
        if let Some(parent_id) = parent_id {
            let parent = self
                .comments
                .iter()
                .find(|c| c.id == parent_id && c.post_id == post_id)
                .ok_or_else(|| AppError::Validation("Parent comment not found".to_string()))?;
            if parent.is_reply() {
                return Err(AppError::Validation(
                    "Replies can only be made to top-level comments".to_string(),
                ));
            }
        }

        let id = self.add_comment(post_id, user.id, content, parent_id);
        self.comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("comment {} vanished", id)))
    }

    /// Comment author or post author may delete. Replies go with their root.
    pub(crate) fn delete_comment(&mut self, id: CommentId, user: &AuthUser) -> Result<(), AppError> {
        let comment = self
            .comments
            .iter()
            .find(|c| c.id == id)
            .ok_or(AppError::NotFound)?;
        let post_author = self.posts.get(&comment.post_id).map(|p| p.author_id);
        if comment.author_id != user.id && post_author != Some(user.id) {
            return Err(AppError::Forbidden);
        }

        self.comments.retain(|c| c.id != id && c.parent_id != Some(id));
        Ok(())
    }

    pub(crate) fn comments_by(&self, username: &str) -> Result<Vec<Comment>, AppError> {
        let author = self.user_id(username).ok_or(AppError::NotFound)?;
        Ok(self
            .comments
            .iter()
            .filter(|c| c.author_id == author)
            .cloned()
            .collect())
    }

    // ============ Likes ============

    /// Returns (liked, like_count) after flipping the user's like.
    pub(crate) fn toggle_like(
        &mut self,
        post_id: PostId,
        user: &AuthUser,
    ) -> Result<(bool, u64), AppError> {
        let row = self.posts.get_mut(&post_id).ok_or(AppError::NotFound)?;
        let liked = if row.likes.remove(&user.id) {
            false
        } else {
            row.likes.insert(user.id);
            true
        };
        Ok((liked, row.likes.len() as u64))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LikeState, PostId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// Rich-text body as produced by the editor
    pub description: String,
    /// Username of the post author
    pub author: String,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub liked_by_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Snapshot used to seed a like toggle for this post.
    pub fn like_state(&self) -> LikeState {
        LikeState::new(self.liked_by_user, self.like_count)
    }
}

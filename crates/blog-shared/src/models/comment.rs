use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentId, PostId, UserId};

/// A comment as the server returns it.
///
/// `parent_id` is `None` for root comments and names a root comment for
/// replies. The server may nest replies under their root in `replies`;
/// clients flatten them before building a thread view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    #[serde(rename = "author")]
    pub author_id: UserId,
    pub author_username: String,
    #[serde(rename = "blog")]
    pub post_id: PostId,
    #[serde(rename = "parent", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

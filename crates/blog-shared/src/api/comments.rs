use serde::{Deserialize, Serialize};

use crate::models::{CommentId, PostId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(rename = "blog")]
    pub post_id: PostId,
    pub content: String,
    #[serde(rename = "parent", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

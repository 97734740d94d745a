use serde::{Deserialize, Serialize};

/// Like state of one post as seen by one viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    #[serde(rename = "like_count", alias = "count")]
    pub count: u64,
}

impl LikeState {
    pub fn new(liked: bool, count: u64) -> Self {
        Self { liked, count }
    }

    /// The state a successful toggle is expected to produce.
    ///
    /// Unliking at zero stays at zero.
    pub fn flipped(self) -> Self {
        if self.liked {
            Self::new(false, self.count.saturating_sub(1))
        } else {
            Self::new(true, self.count.saturating_add(1))
        }
    }
}

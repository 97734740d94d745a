use std::sync::Arc;

use crate::api::ApiError;

/// Failure of a comment tree operation.
///
/// Clonable so the last failure can be kept in the tree's status while also
/// being returned to the caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CommentError {
    #[error("Failed to fetch comments: {0}")]
    Fetch(#[source] Arc<ApiError>),
    #[error("Failed to post comment: {0}")]
    Post(#[source] Arc<ApiError>),
    #[error("Failed to delete comment: {0}")]
    Delete(#[source] Arc<ApiError>),
    #[error("Not allowed: {0}")]
    Authorization(#[source] Arc<ApiError>),
}

impl CommentError {
    pub(crate) fn fetch(err: ApiError) -> Self {
        CommentError::Fetch(Arc::new(err))
    }

    pub(crate) fn post(err: ApiError) -> Self {
        if err.is_auth_rejection() {
            CommentError::Authorization(Arc::new(err))
        } else {
            CommentError::Post(Arc::new(err))
        }
    }

    pub(crate) fn delete(err: ApiError) -> Self {
        if err.is_auth_rejection() {
            CommentError::Authorization(Arc::new(err))
        } else {
            CommentError::Delete(Arc::new(err))
        }
    }

    /// The transport error behind this failure.
    pub fn api_error(&self) -> &ApiError {
        match self {
            CommentError::Fetch(e)
            | CommentError::Post(e)
            | CommentError::Delete(e)
            | CommentError::Authorization(e) => e,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LikeError {
    #[error("Failed to toggle like: {0}")]
    Toggle(#[source] Arc<ApiError>),
}

impl LikeError {
    pub fn api_error(&self) -> &ApiError {
        match self {
            LikeError::Toggle(e) => e,
        }
    }
}

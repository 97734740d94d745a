//! Remote seams used by the controllers.
//!
//! [`ApiClient`] implements both traits over HTTP. Tests plug in fakes.

use async_trait::async_trait;
use blog_shared::{api::CreateCommentRequest, Comment, CommentId, LikeState, PostId};

use crate::api::{ApiClient, ApiError};
use crate::session::Session;

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Every comment of the post, in server order.
    async fn list_comments(
        &self,
        session: &Session,
        post_id: PostId,
    ) -> Result<Vec<Comment>, ApiError>;

    /// Returns the created comment when the server echoes it back.
    async fn create_comment(
        &self,
        session: &Session,
        request: &CreateCommentRequest,
    ) -> Result<Option<Comment>, ApiError>;

    async fn delete_comment(&self, session: &Session, comment_id: CommentId)
        -> Result<(), ApiError>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Flip the viewer's like and return the resulting state.
    async fn toggle_like(&self, session: &Session, post_id: PostId)
        -> Result<LikeState, ApiError>;
}

#[async_trait]
impl CommentStore for ApiClient {
    async fn list_comments(
        &self,
        session: &Session,
        post_id: PostId,
    ) -> Result<Vec<Comment>, ApiError> {
        ApiClient::list_comments(self, session, post_id).await
    }

    async fn create_comment(
        &self,
        session: &Session,
        request: &CreateCommentRequest,
    ) -> Result<Option<Comment>, ApiError> {
        ApiClient::create_comment(self, session, request).await
    }

    async fn delete_comment(
        &self,
        session: &Session,
        comment_id: CommentId,
    ) -> Result<(), ApiError> {
        ApiClient::delete_comment(self, session, comment_id).await
    }
}

#[async_trait]
impl LikeStore for ApiClient {
    async fn toggle_like(
        &self,
        session: &Session,
        post_id: PostId,
    ) -> Result<LikeState, ApiError> {
        ApiClient::toggle_like(self, session, post_id).await
    }
}

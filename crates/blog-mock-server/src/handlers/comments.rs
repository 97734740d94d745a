use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use blog_shared::{api::CreateCommentRequest, Comment, CommentId, PostId};

use super::enter;
use crate::auth::CurrentUser;
use crate::db::Route;
use crate::error::AppError;
use crate::routes::AppState;

/// GET /api/blogs/:id/comments/
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
) -> Result<Json<Vec<Comment>>, AppError> {
    enter(&state, Route::ListComments).await?;

    let comments = state.db.lock().list_comments(post_id)?;
    Ok(Json(comments))
}

/// POST /api/blogs/:id/comments/
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<PostId>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let user = user.require()?;
    enter(&state, Route::CreateComment).await?;

    // The post in the path wins over the one in the body.
    let comment = state
        .db
        .lock()
        .create_comment(post_id, &user, &req.content, req.parent_id)?;

    tracing::debug!(post_id = %post_id, comment_id = %comment.id, "Comment created");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /api/comments/:id/
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(comment_id): Path<CommentId>,
) -> Result<StatusCode, AppError> {
    let user = user.require()?;
    enter(&state, Route::DeleteComment).await?;

    state.db.lock().delete_comment(comment_id, &user)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/comments/user/:username/
pub async fn user_comments(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Comment>>, AppError> {
    enter(&state, Route::UserComments).await?;

    let comments = state.db.lock().comments_by(&username)?;
    Ok(Json(comments))
}

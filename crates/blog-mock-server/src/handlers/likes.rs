use axum::{
    extract::{Path, State},
    Extension, Json,
};
use blog_shared::{LikeState, PostId};

use super::enter;
use crate::auth::CurrentUser;
use crate::db::Route;
use crate::error::AppError;
use crate::routes::AppState;

/// POST /api/blogs/:id/like/
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<PostId>,
) -> Result<Json<LikeState>, AppError> {
    let user = user.require()?;
    enter(&state, Route::ToggleLike).await?;

    let (liked, count) = state.db.lock().toggle_like(post_id, &user)?;
    tracing::debug!(post_id = %post_id, user = %user.username, liked, count, "Like toggled");
    Ok(Json(LikeState::new(liked, count)))
}

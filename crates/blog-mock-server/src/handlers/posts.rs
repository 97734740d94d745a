use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use blog_shared::{
    api::{CreatePostRequest, UpdatePostRequest},
    Post, PostId,
};

use super::enter;
use crate::auth::CurrentUser;
use crate::db::Route;
use crate::error::AppError;
use crate::routes::AppState;

fn validate(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    Ok(())
}

/// GET /api/blogs/
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Post>>, AppError> {
    enter(&state, Route::ListPosts).await?;

    let posts = state.db.lock().list_posts(user.id());
    Ok(Json(posts))
}

/// POST /api/blogs/
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let user = user.require()?;
    enter(&state, Route::CreatePost).await?;
    validate(&req.title)?;

    let post = {
        let mut db = state.db.lock();
        let id = db.add_post(user.id, &req.title, &req.description);
        db.get_post(id, Some(user.id))?
    };
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/blogs/:id/
pub async fn get_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<PostId>,
) -> Result<Json<Post>, AppError> {
    enter(&state, Route::GetPost).await?;

    let post = state.db.lock().get_post(post_id, user.id())?;
    Ok(Json(post))
}

/// PUT /api/blogs/:id/
pub async fn update_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<PostId>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let user = user.require()?;
    enter(&state, Route::UpdatePost).await?;
    validate(&req.title)?;

    let post = state
        .db
        .lock()
        .update_post(post_id, &user, req.title, req.description)?;
    Ok(Json(post))
}

/// DELETE /api/blogs/:id/
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<PostId>,
) -> Result<StatusCode, AppError> {
    let user = user.require()?;
    enter(&state, Route::DeletePost).await?;

    state.db.lock().delete_post(post_id, &user)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/blogs/user/:username/
pub async fn user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Post>>, AppError> {
    enter(&state, Route::UserPosts).await?;

    let posts = state.db.lock().posts_by(&username)?;
    Ok(Json(posts))
}

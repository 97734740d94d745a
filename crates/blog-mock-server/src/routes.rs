use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::auth_middleware;
use crate::db::DbPool;
use crate::handlers::{comments as comment_handlers, likes as like_handlers, posts as post_handlers};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
}

pub fn create_router(db: DbPool) -> Router {
    let state = AppState { db };

    // Paths keep the trailing slash the service uses
    let api_routes = Router::new()
        .route(
            "/blogs/",
            get(post_handlers::list_posts).post(post_handlers::create_post),
        )
        .route(
            "/blogs/:id/",
            get(post_handlers::get_post)
                .put(post_handlers::update_post)
                .delete(post_handlers::delete_post),
        )
        .route("/blogs/user/:username/", get(post_handlers::user_posts))
        .route(
            "/blogs/:id/comments/",
            get(comment_handlers::list_comments).post(comment_handlers::create_comment),
        )
        .route("/blogs/:id/like/", post(like_handlers::toggle_like))
        .route("/comments/:id/", delete(comment_handlers::delete_comment))
        .route("/comments/user/:username/", get(comment_handlers::user_comments))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use blog_shared::UserId;

use crate::{error::AppError, routes::AppState};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
}

/// The caller, if the request carried a known token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<AuthUser>);

impl CurrentUser {
    pub fn id(&self) -> Option<UserId> {
        self.0.as_ref().map(|u| u.id)
    }

    pub fn require(self) -> Result<AuthUser, AppError> {
        self.0.ok_or(AppError::Unauthorized)
    }
}

/// Resolve `Authorization: Token <key>` (or `Bearer <key>`).
///
/// A missing header is allowed through as anonymous; a header with an
/// unknown token is rejected.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let user = match header {
        None => None,
        Some(value) => {
            let token = value
                .strip_prefix("Token ")
                .or_else(|| value.strip_prefix("Bearer "))
                .ok_or(AppError::Unauthorized)?;
            let user = state
                .db
                .lock()
                .user_by_token(token)
                .ok_or(AppError::Unauthorized)?;
            Some(user)
        }
    };

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

use blog_shared::{
    api::{CreateCommentRequest, CreatePostRequest, UpdatePostRequest},
    Comment, CommentId, LikeState, Post, PostId,
};
use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Access forbidden")]
    Forbidden,
    #[error("Resource not found")]
    NotFound,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Request cancelled")]
    Cancelled,
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }
}

impl ApiError {
    /// Whether the server refused the caller's credentials or privileges.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }
}

/// HTTP client for the blog service.
///
/// Holds no identity of its own: every call takes the [`Session`] to act as.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth_scheme: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|e| ApiError::Other(e.into()))?;

        tracing::debug!(
            base_url = %config.base_url,
            timeout_ms = config.effective_timeout().as_millis() as u64,
            "Creating API client"
        );

        let client = Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_scheme: config.auth_scheme.clone(),
        })
    }

    /// Build URL for endpoint
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Auth header value for the session, if it carries a token
    fn auth_header(&self, session: &Session) -> Option<String> {
        session
            .token()
            .map(|token| format!("{} {}", self.auth_scheme, token))
    }

    /// Start a request, attaching credentials when the session has them
    fn request(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.auth_header(session) {
            Some(header) => builder.header(AUTHORIZATION, header),
            None => builder,
        }
    }

    /// Start a request that the server only accepts with credentials
    fn authed_request(
        &self,
        method: Method,
        path: &str,
        session: &Session,
    ) -> Result<RequestBuilder, ApiError> {
        if !session.is_authenticated() {
            return Err(ApiError::Unauthorized);
        }
        Ok(self.request(method, path, session))
    }

    // ============ Request Helpers ============

    async fn get(&self, session: &Session, path: &str) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(path, "GET");
        Ok(self.request(Method::GET, path, session).send().await?)
    }

    async fn authed_post<T: serde::Serialize>(
        &self,
        session: &Session,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(path, "POST");
        Ok(self
            .authed_request(Method::POST, path, session)?
            .json(body)
            .send()
            .await?)
    }

    async fn authed_post_empty(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(path, "POST");
        Ok(self
            .authed_request(Method::POST, path, session)?
            .send()
            .await?)
    }

    async fn authed_put<T: serde::Serialize>(
        &self,
        session: &Session,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(path, "PUT");
        Ok(self
            .authed_request(Method::PUT, path, session)?
            .json(body)
            .send()
            .await?)
    }

    async fn authed_delete(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(path, "DELETE");
        Ok(self
            .authed_request(Method::DELETE, path, session)?
            .send()
            .await?)
    }

    /// Map a non-success status to an error
    async fn status_error(response: reqwest::Response) -> ApiError {
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let text = response.text().await.unwrap_or_default();
                ApiError::Validation(text)
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                ApiError::Server(format!("{}: {}", status, text))
            }
        }
    }

    /// Handle API response
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let bytes = response.bytes().await?;
                Ok(serde_json::from_slice(&bytes)?)
            }
            _ => Err(Self::status_error(response).await),
        }
    }

    /// Handle a response whose body is optional (a bare 2xx ack is accepted)
    async fn handle_optional_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<T>, ApiError> {
        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => {
                let bytes = response.bytes().await?;
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(None);
                }
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            StatusCode::NO_CONTENT => Ok(None),
            _ => Err(Self::status_error(response).await),
        }
    }

    /// Handle empty response
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ApiError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::status_error(response).await)
        }
    }

    // ============ Posts ============

    pub async fn list_posts(&self, session: &Session) -> Result<Vec<Post>, ApiError> {
        let response = self.get(session, "/blogs/").await?;
        self.handle_response(response).await
    }

    pub async fn get_post(&self, session: &Session, post_id: PostId) -> Result<Post, ApiError> {
        let response = self.get(session, &format!("/blogs/{}/", post_id)).await?;
        self.handle_response(response).await
    }

    pub async fn create_post(
        &self,
        session: &Session,
        title: &str,
        description: &str,
    ) -> Result<Post, ApiError> {
        let req = CreatePostRequest {
            title: title.to_string(),
            description: description.to_string(),
        };
        let response = self.authed_post(session, "/blogs/", &req).await?;
        self.handle_response(response).await
    }

    pub async fn update_post(
        &self,
        session: &Session,
        post_id: PostId,
        title: &str,
        description: &str,
    ) -> Result<Post, ApiError> {
        let req = UpdatePostRequest {
            title: title.to_string(),
            description: description.to_string(),
        };
        let response = self
            .authed_put(session, &format!("/blogs/{}/", post_id), &req)
            .await?;
        self.handle_response(response).await
    }

    pub async fn delete_post(&self, session: &Session, post_id: PostId) -> Result<(), ApiError> {
        let response = self
            .authed_delete(session, &format!("/blogs/{}/", post_id))
            .await?;
        self.handle_empty_response(response).await
    }

    pub async fn user_posts(&self, session: &Session, username: &str) -> Result<Vec<Post>, ApiError> {
        let response = self
            .get(
                session,
                &format!("/blogs/user/{}/", urlencoding::encode(username)),
            )
            .await?;
        self.handle_response(response).await
    }

    // ============ Comments ============

    pub async fn list_comments(
        &self,
        session: &Session,
        post_id: PostId,
    ) -> Result<Vec<Comment>, ApiError> {
        let response = self
            .get(session, &format!("/blogs/{}/comments/", post_id))
            .await?;
        self.handle_response(response).await
    }

    pub async fn create_comment(
        &self,
        session: &Session,
        req: &CreateCommentRequest,
    ) -> Result<Option<Comment>, ApiError> {
        let response = self
            .authed_post(session, &format!("/blogs/{}/comments/", req.post_id), req)
            .await?;
        self.handle_optional_response(response).await
    }

    pub async fn delete_comment(
        &self,
        session: &Session,
        comment_id: CommentId,
    ) -> Result<(), ApiError> {
        let response = self
            .authed_delete(session, &format!("/comments/{}/", comment_id))
            .await?;
        self.handle_empty_response(response).await
    }

    pub async fn user_comments(
        &self,
        session: &Session,
        username: &str,
    ) -> Result<Vec<Comment>, ApiError> {
        let response = self
            .get(
                session,
                &format!("/comments/user/{}/", urlencoding::encode(username)),
            )
            .await?;
        self.handle_response(response).await
    }

    // ============ Likes ============

    pub async fn toggle_like(
        &self,
        session: &Session,
        post_id: PostId,
    ) -> Result<LikeState, ApiError> {
        let response = self
            .authed_post_empty(session, &format!("/blogs/{}/like/", post_id))
            .await?;
        self.handle_response(response).await
    }
}

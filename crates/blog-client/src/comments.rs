//! Threaded comments of one post, kept in sync with the server.
//!
//! Mutations are not patched into the local view. After a create or delete
//! succeeds the whole list is fetched again, so the view always matches
//! what the server holds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use blog_shared::{api::CreateCommentRequest, Comment, CommentId, PostId};
use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::CommentError;
use crate::guard::CallGuard;
use crate::session::Session;
use crate::store::CommentStore;
use crate::tree::{build_tree, flatten, Threads};

/// Observable state of a [`CommentTree`].
///
/// An error never clears the data from the last successful load.
#[derive(Debug, Clone)]
pub enum TreeStatus {
    Loaded,
    Error(CommentError),
}

impl TreeStatus {
    pub fn error(&self) -> Option<&CommentError> {
        match self {
            TreeStatus::Loaded => None,
            TreeStatus::Error(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// The server accepted the comment and the tree was reloaded.
    Posted { id: Option<CommentId> },
    /// Blank content; nothing was sent.
    Skipped,
}

#[derive(Debug)]
struct TreeState {
    comments: Vec<Comment>,
    threads: Threads,
    status: TreeStatus,
    /// Generation of the load whose response is currently shown
    applied: u64,
}

pub struct CommentTree {
    store: Arc<dyn CommentStore>,
    post_id: PostId,
    state: RwLock<TreeState>,
    generation: AtomicU64,
    mutations: Option<Mutex<()>>,
    guard: CallGuard,
}

impl CommentTree {
    /// An empty tree for `post_id`. Nothing is fetched until [`load`](Self::load).
    pub fn new(store: Arc<dyn CommentStore>, post_id: PostId) -> Self {
        Self {
            store,
            post_id,
            state: RwLock::new(TreeState {
                comments: Vec::new(),
                threads: Threads::default(),
                status: TreeStatus::Loaded,
                applied: 0,
            }),
            generation: AtomicU64::new(0),
            mutations: None,
            guard: CallGuard::default(),
        }
    }

    /// Run each post/delete and its reload one at a time.
    pub fn serialize_mutations(mut self, enabled: bool) -> Self {
        self.mutations = enabled.then(|| Mutex::new(()));
        self
    }

    /// Fail any remote call that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.guard.set_timeout(timeout);
        self
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn threads(&self) -> Threads {
        self.state.read().threads.clone()
    }

    /// The flat list from the last successful load.
    pub fn comments(&self) -> Vec<Comment> {
        self.state.read().comments.clone()
    }

    pub fn status(&self) -> TreeStatus {
        self.state.read().status.clone()
    }

    /// Number of comments in the last loaded list, orphans included.
    pub fn len(&self) -> usize {
        self.state.read().comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().comments.is_empty()
    }

    /// Abort outstanding calls and refuse new ones.
    pub fn cancel(&self) {
        self.guard.cancel();
    }

    /// Fetch the full list for the post and rebuild the thread view.
    pub async fn load(&self, session: &Session) -> Result<Threads, CommentError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(post_id = %self.post_id, generation, "Loading comments");

        let result = self
            .guard
            .run(self.store.list_comments(session, self.post_id))
            .await;

        let mut state = self.state.write();
        if generation < state.applied {
            tracing::debug!(
                post_id = %self.post_id,
                generation,
                applied = state.applied,
                "Discarding stale comment load"
            );
            return match result {
                Ok(_) => Ok(state.threads.clone()),
                Err(err) => {
                    // Data from the newer load stays; the failure still shows.
                    let err = CommentError::fetch(err);
                    state.status = TreeStatus::Error(err.clone());
                    Err(err)
                }
            };
        }

        match result {
            Ok(comments) => {
                let comments = flatten(comments);
                let threads = build_tree(&comments);
                if !threads.orphaned.is_empty() {
                    tracing::debug!(
                        post_id = %self.post_id,
                        orphaned = ?threads.orphaned,
                        "Dropping replies without a root"
                    );
                }
                state.comments = comments;
                state.threads = threads.clone();
                state.status = TreeStatus::Loaded;
                state.applied = generation;
                Ok(threads)
            }
            Err(err) => {
                let err = CommentError::fetch(err);
                tracing::warn!(post_id = %self.post_id, error = %err, "Comment load failed");
                state.status = TreeStatus::Error(err.clone());
                Err(err)
            }
        }
    }

    /// Create a comment, or a reply when `parent_id` names a root comment.
    ///
    /// Blank content is skipped without a request. On success the tree is
    /// reloaded; if only the reload fails the error is a fetch error.
    pub async fn post(
        &self,
        session: &Session,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> Result<PostOutcome, CommentError> {
        if content.trim().is_empty() {
            tracing::debug!(post_id = %self.post_id, "Skipping blank comment");
            return Ok(PostOutcome::Skipped);
        }

        let _queued = self.queue().await;
        let request = CreateCommentRequest {
            post_id: self.post_id,
            content: content.to_string(),
            parent_id,
        };

        let created = match self
            .guard
            .run(self.store.create_comment(session, &request))
            .await
        {
            Ok(created) => created,
            Err(err) => {
                let err = CommentError::post(err);
                tracing::warn!(post_id = %self.post_id, error = %err, "Posting comment failed");
                self.set_error(err.clone());
                return Err(err);
            }
        };

        let id = created.map(|c| c.id);
        tracing::debug!(post_id = %self.post_id, id = ?id, "Comment posted");

        self.load(session).await?;
        Ok(PostOutcome::Posted { id })
    }

    /// Delete a comment, then reload.
    ///
    /// Permission is checked by the server; see [`can_delete`](crate::can_delete)
    /// for gating the action up front.
    pub async fn delete(&self, session: &Session, comment_id: CommentId) -> Result<(), CommentError> {
        let _queued = self.queue().await;

        if let Err(err) = self
            .guard
            .run(self.store.delete_comment(session, comment_id))
            .await
        {
            let err = CommentError::delete(err);
            tracing::warn!(
                post_id = %self.post_id,
                comment_id = %comment_id,
                error = %err,
                "Deleting comment failed"
            );
            self.set_error(err.clone());
            return Err(err);
        }

        tracing::debug!(post_id = %self.post_id, comment_id = %comment_id, "Comment deleted");
        self.load(session).await?;
        Ok(())
    }

    async fn queue(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.mutations {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }

    fn set_error(&self, err: CommentError) {
        self.state.write().status = TreeStatus::Error(err);
    }
}

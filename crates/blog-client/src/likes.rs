//! Optimistic like toggle for one post.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use blog_shared::{LikeState, Post, PostId};
use parking_lot::Mutex;

use crate::error::LikeError;
use crate::guard::CallGuard;
use crate::session::Session;
use crate::store::LikeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The server's state after the toggle, now also the local state.
    Reconciled(LikeState),
    /// Another toggle was still in flight; nothing was sent.
    Ignored,
}

pub struct LikeToggle {
    store: Arc<dyn LikeStore>,
    post_id: PostId,
    state: Mutex<LikeState>,
    in_flight: AtomicBool,
    guard: CallGuard,
}

/// Restores the snapshot unless the toggle settled with a server answer,
/// and always releases the in-flight flag.
struct Pending<'a> {
    toggle: &'a LikeToggle,
    snapshot: LikeState,
    settled: bool,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.toggle.state.lock() = self.snapshot;
        }
        self.toggle.in_flight.store(false, Ordering::Release);
    }
}

impl LikeToggle {
    pub fn new(store: Arc<dyn LikeStore>, post_id: PostId, initial: LikeState) -> Self {
        Self {
            store,
            post_id,
            state: Mutex::new(initial),
            in_flight: AtomicBool::new(false),
            guard: CallGuard::default(),
        }
    }

    /// Seed from the like snapshot carried by a loaded post.
    pub fn from_post(store: Arc<dyn LikeStore>, post: &Post) -> Self {
        Self::new(store, post.id, post.like_state())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.guard.set_timeout(timeout);
        self
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Current state, including an optimistic flip while a toggle is in flight.
    pub fn state(&self) -> LikeState {
        *self.state.lock()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Replace the state with a fresh server snapshot, e.g. after the post
    /// was reloaded. Ignored while a toggle is in flight.
    pub fn sync(&self, state: LikeState) -> bool {
        if self.is_pending() {
            return false;
        }
        *self.state.lock() = state;
        true
    }

    /// Abort an outstanding toggle (it rolls back) and refuse new ones.
    pub fn cancel(&self) {
        self.guard.cancel();
    }

    /// Flip the like locally, then commit the server answer or roll back.
    ///
    /// On failure the state is restored to exactly what it was before the
    /// call. A call made while another is in flight returns
    /// [`ToggleOutcome::Ignored`] without contacting the server.
    pub async fn toggle(&self, session: &Session) -> Result<ToggleOutcome, LikeError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(post_id = %self.post_id, "Toggle already in flight, ignoring");
            return Ok(ToggleOutcome::Ignored);
        }

        let mut pending = {
            let mut state = self.state.lock();
            let snapshot = *state;
            *state = snapshot.flipped();
            Pending {
                toggle: self,
                snapshot,
                settled: false,
            }
        };
        tracing::debug!(
            post_id = %self.post_id,
            from = ?pending.snapshot,
            "Applied optimistic like toggle"
        );

        match self
            .guard
            .run(self.store.toggle_like(session, self.post_id))
            .await
        {
            Ok(server) => {
                *self.state.lock() = server;
                pending.settled = true;
                tracing::debug!(post_id = %self.post_id, state = ?server, "Like toggle committed");
                Ok(ToggleOutcome::Reconciled(server))
            }
            Err(err) => {
                tracing::warn!(
                    post_id = %self.post_id,
                    error = %err,
                    restored = ?pending.snapshot,
                    "Like toggle failed, rolling back"
                );
                drop(pending);
                Err(LikeError::Toggle(Arc::new(err)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::api::ApiError;

    #[derive(Default)]
    struct FakeLikes {
        calls: AtomicUsize,
        /// Answer to return; `None` fails the call
        answer: Mutex<Option<LikeState>>,
        /// When set, calls wait for this before answering
        gate: Option<Arc<Notify>>,
    }

    impl FakeLikes {
        fn answering(state: LikeState) -> Arc<Self> {
            Arc::new(Self {
                answer: Mutex::new(Some(state)),
                ..Self::default()
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn gated(state: Option<LikeState>, gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                answer: Mutex::new(state),
                gate: Some(gate),
                ..Self::default()
            })
        }
    }

    #[async_trait]
    impl LikeStore for FakeLikes {
        async fn toggle_like(
            &self,
            _session: &Session,
            _post_id: PostId,
        ) -> Result<LikeState, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let answer = *self.answer.lock();
            answer.ok_or_else(|| ApiError::Server("500 Internal Server Error".into()))
        }
    }

    fn session() -> Session {
        Session::new("alice", "token")
    }

    #[tokio::test]
    async fn test_success_takes_server_values() {
        let store = FakeLikes::answering(LikeState::new(true, 6));
        let toggle = LikeToggle::new(store.clone(), PostId(1), LikeState::new(false, 5));

        let outcome = toggle.toggle(&session()).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Reconciled(LikeState::new(true, 6)));
        assert_eq!(toggle.state(), LikeState::new(true, 6));
        assert!(!toggle.is_pending());
    }

    #[tokio::test]
    async fn test_server_answer_wins_over_optimistic_guess() {
        // Someone else liked in the meantime.
        let store = FakeLikes::answering(LikeState::new(true, 9));
        let toggle = LikeToggle::new(store, PostId(1), LikeState::new(false, 5));

        toggle.toggle(&session()).await.unwrap();
        assert_eq!(toggle.state(), LikeState::new(true, 9));
    }

    #[tokio::test]
    async fn test_failure_restores_exact_snapshot() {
        let starts = [
            LikeState::new(false, 0),
            LikeState::new(false, 5),
            LikeState::new(true, 1),
            LikeState::new(true, 0),
            LikeState::new(true, u64::MAX),
        ];
        for start in starts {
            let toggle = LikeToggle::new(FakeLikes::failing(), PostId(1), start);
            let err = toggle.toggle(&session()).await.unwrap_err();
            assert!(matches!(err, LikeError::Toggle(_)));
            assert_eq!(toggle.state(), start);
            assert!(!toggle.is_pending());
        }
    }

    #[tokio::test]
    async fn test_optimistic_flip_is_visible_while_pending() {
        let gate = Arc::new(Notify::new());
        let store = FakeLikes::gated(Some(LikeState::new(true, 6)), gate.clone());
        let toggle = LikeToggle::new(store, PostId(1), LikeState::new(false, 5));

        let session = session();
        let observe = async {
            tokio::task::yield_now().await;
            let seen = (toggle.state(), toggle.is_pending());
            gate.notify_one();
            seen
        };
        let (result, seen) = tokio::join!(toggle.toggle(&session), observe);

        assert_eq!(seen, (LikeState::new(true, 6), true));
        assert_eq!(result.unwrap(), ToggleOutcome::Reconciled(LikeState::new(true, 6)));
    }

    #[tokio::test]
    async fn test_second_toggle_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let store = FakeLikes::gated(Some(LikeState::new(true, 6)), gate.clone());
        let toggle = LikeToggle::new(store.clone(), PostId(1), LikeState::new(false, 5));

        let session = session();
        let second = async {
            let outcome = toggle.toggle(&session).await;
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(toggle.toggle(&session), second);

        assert_eq!(second.unwrap(), ToggleOutcome::Ignored);
        assert_eq!(first.unwrap(), ToggleOutcome::Reconciled(LikeState::new(true, 6)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(toggle.state(), LikeState::new(true, 6));
    }

    #[tokio::test]
    async fn test_failed_toggle_can_be_retried() {
        let store = FakeLikes::failing();
        let toggle = LikeToggle::new(store.clone(), PostId(1), LikeState::new(false, 5));

        assert!(toggle.toggle(&session()).await.is_err());
        *store.answer.lock() = Some(LikeState::new(true, 6));

        let outcome = toggle.toggle(&session()).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Reconciled(LikeState::new(true, 6)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dropped_toggle_rolls_back() {
        let gate = Arc::new(Notify::new());
        let store = FakeLikes::gated(Some(LikeState::new(true, 6)), gate);
        let toggle = LikeToggle::new(store, PostId(1), LikeState::new(false, 5));

        let session = session();
        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), toggle.toggle(&session)).await;

        assert!(timed_out.is_err());
        assert_eq!(toggle.state(), LikeState::new(false, 5));
        assert!(!toggle.is_pending());
    }

    #[tokio::test]
    async fn test_timeout_rolls_back() {
        let gate = Arc::new(Notify::new());
        let store = FakeLikes::gated(Some(LikeState::new(true, 6)), gate);
        let toggle = LikeToggle::new(store, PostId(1), LikeState::new(true, 3))
            .with_timeout(Duration::from_millis(20));

        let err = toggle.toggle(&session()).await.unwrap_err();
        assert!(matches!(err.api_error(), ApiError::Timeout));
        assert_eq!(toggle.state(), LikeState::new(true, 3));
    }

    #[tokio::test]
    async fn test_sync_is_refused_while_pending() {
        let gate = Arc::new(Notify::new());
        let store = FakeLikes::gated(Some(LikeState::new(true, 6)), gate.clone());
        let toggle = LikeToggle::new(store, PostId(1), LikeState::new(false, 5));

        let session = session();
        let resync = async {
            tokio::task::yield_now().await;
            let accepted = toggle.sync(LikeState::new(false, 100));
            gate.notify_one();
            accepted
        };
        let (_, accepted) = tokio::join!(toggle.toggle(&session), resync);

        assert!(!accepted);
        assert!(toggle.sync(LikeState::new(false, 100)));
        assert_eq!(toggle.state(), LikeState::new(false, 100));
    }
}

//! Cancellation and timeout for remote calls.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api::ApiError;

/// Bounds the remote calls made by one controller.
///
/// Every call races the controller's cancellation token and, when set, a
/// per-call timeout.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallGuard {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl CallGuard {
    pub(crate) fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) async fn run<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => Err(ApiError::Timeout),
                },
                None => call.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ApiError::Cancelled),
            result = bounded => result,
        }
    }
}

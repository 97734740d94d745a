//! In-memory implementation of the blog service endpoints.
//!
//! Used by the client's integration tests and runnable on its own for local
//! experiments with the `blog` CLI.

mod auth;
pub mod config;
pub mod db;
mod error;
mod handlers;
pub mod routes;

use std::net::SocketAddr;

use parking_lot::MutexGuard;
use tokio::{net::TcpListener, task::JoinHandle};

pub use db::{Db, DbPool, Route};
pub use routes::create_router;

/// A mock service bound to an ephemeral local port.
///
/// The server task is aborted when this value is dropped.
pub struct MockServer {
    addr: SocketAddr,
    db: DbPool,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(db: Db) -> anyhow::Result<Self> {
        let db = db.into_pool();
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = create_router(db.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock server stopped: {}", e);
            }
        });

        tracing::debug!("Mock server listening on {}", addr);
        Ok(Self { addr, db, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Service root to hand to the client.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Lock the backing store. Do not hold the guard across an `.await`.
    pub fn db(&self) -> MutexGuard<'_, Db> {
        self.db.lock()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

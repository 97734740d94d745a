//! Client core for the blog service.
//!
//! Two controllers sit on top of the remote stores:
//!
//! - [`CommentTree`] keeps the two-level comment thread of one post and
//!   refetches the server list after every successful mutation.
//! - [`LikeToggle`] keeps the like state of one post, flips it
//!   optimistically and then commits the server answer or restores the
//!   snapshot taken before the flip.
//!
//! Identity is passed explicitly as a [`Session`] on every call.

pub mod api;
pub mod comments;
pub mod config;
pub mod error;
mod guard;
pub mod likes;
pub mod session;
pub mod store;
pub mod tree;

pub use api::{ApiClient, ApiError};
pub use comments::{CommentTree, PostOutcome, TreeStatus};
pub use config::{ClientConfig, ConfigError};
pub use error::{CommentError, LikeError};
pub use likes::{LikeToggle, ToggleOutcome};
pub use session::Session;
pub use store::{CommentStore, LikeStore};
pub use tree::{build_tree, can_delete, is_post_author, Thread, Threads};

mod comment;
mod ids;
mod like;
mod post;

pub use comment::*;
pub use ids::*;
pub use like::*;
pub use post::*;

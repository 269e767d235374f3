//! Domain entities - the core business objects.

mod post;
mod session;
pub mod slug;

pub use post::{
    Author, NewPost, Post, PostPatch, PostStatus, Publication, PublishOutcome, timestamp,
};
pub use session::Session;

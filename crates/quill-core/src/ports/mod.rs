//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod content;
mod repository;

pub use auth::{AuthError, SessionVerifier};
pub use content::{DraftStore, FeedQuery, FeedScope, PageSource};
pub use repository::{ListQuery, PostRepository};

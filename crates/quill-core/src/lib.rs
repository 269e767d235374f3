//! # Quill Core
//!
//! The domain layer of Quill.
//! Posts, the publish transition, draft autosave and the paginated feed client.
//! Storage and identity are reached only through the traits in [`ports`].

pub mod autosave;
pub mod debounce;
pub mod domain;
pub mod error;
pub mod feed;
pub mod pagination;
pub mod ports;
pub mod service;

pub use error::{DomainError, RepoError};

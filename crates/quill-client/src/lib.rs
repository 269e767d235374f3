//! # Quill Client
//!
//! Talks to the Quill API over HTTP. [`QuillClient`] is the remote
//! [`DraftStore`](quill_core::ports::DraftStore) behind an autosave controller
//! and the remote [`PageSource`](quill_core::ports::PageSource) behind a feed.

mod client;
mod error;

pub use client::{ClientConfig, QuillClient};
pub use error::ClientError;

//! # Quill Shared
//!
//! Wire types shared by the API server and the HTTP client.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;

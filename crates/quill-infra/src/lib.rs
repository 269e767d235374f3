//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! post repositories and the session token verifier.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL repository via SeaORM
//! - `minimal` - No external services, in-memory repository only

pub mod auth;
pub mod cursor;
pub mod database;

pub use auth::{JwtConfig, JwtSessionVerifier};
pub use database::{DatabaseConfig, InMemoryPostRepository};

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, connect};

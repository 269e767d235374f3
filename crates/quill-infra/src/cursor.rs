//! Keyset cursor codec.
//!
//! A cursor names the last row of a page by its sort timestamp and id, so the
//! next page starts strictly after it no matter what was inserted meanwhile.
//! Clients only ever see the encoded string.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use quill_core::RepoError;
use quill_core::pagination::Cursor;

/// Position of a row in a `(timestamp DESC, id DESC)` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Keyset {
    pub at: DateTime<Utc>,
    pub id: Uuid,
}

impl Keyset {
    pub fn new(at: DateTime<Utc>, id: Uuid) -> Self {
        Self { at, id }
    }

    pub fn encode(&self) -> Cursor {
        Cursor::new(format!("{}.{}", self.at.timestamp_micros(), self.id.simple()))
    }

    pub fn decode(cursor: &Cursor) -> Result<Self, RepoError> {
        let invalid = || RepoError::InvalidCursor(cursor.to_string());

        let (micros, id) = cursor.as_str().split_once('.').ok_or_else(invalid)?;
        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let at = DateTime::from_timestamp_micros(micros).ok_or_else(invalid)?;
        let id = Uuid::try_parse(id).map_err(|_| invalid())?;

        Ok(Self { at, id })
    }
}

//! Cursor pagination types shared by the repository, the service and the
//! feed client.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Opaque resume point returned by a paginated query.
///
/// Only repository adapters know how to read one. Everyone else passes it
/// back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One batch of a paginated listing.
///
/// `after` is absent on the last page the server knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, after: Option<Cursor>) -> Self {
        Self { data, after }
    }

    pub fn last(data: Vec<T>) -> Self {
        Self { data, after: None }
    }

    pub fn has_more(&self) -> bool {
        self.after.is_some()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            after: self.after,
        }
    }
}

/// Validate a caller-supplied page size, falling back to the default.
pub fn page_size(requested: Option<u32>) -> Result<u32, DomainError> {
    match requested {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(size) if (1..=MAX_PAGE_SIZE).contains(&size) => Ok(size),
        Some(size) => Err(DomainError::Validation(format!(
            "Page size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
        ))),
    }
}

/// Split `limit + 1` fetched items into a page, using `cursor_of` on the last
/// kept item when more remain.
pub fn paginate<T>(mut items: Vec<T>, limit: usize, cursor_of: impl Fn(&T) -> Cursor) -> Page<T> {
    if items.len() <= limit {
        return Page::last(items);
    }

    items.truncate(limit);
    let after = items.last().map(cursor_of);
    Page::new(items, after)
}

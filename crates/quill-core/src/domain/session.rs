use serde::{Deserialize, Serialize};

use super::post::{Author, Post};

/// Signed-in user as reported by the identity provider.
///
/// Passed explicitly into every operation that needs identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

impl Session {
    /// Snapshot stored on posts this user creates.
    pub fn author(&self) -> Author {
        Author {
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
        }
    }

    /// Ownership is decided by the author's email alone, compared exactly as
    /// the repositories filter it.
    pub fn owns(&self, post: &Post) -> bool {
        self.email == post.author.email
    }
}

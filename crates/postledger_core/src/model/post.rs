//! Post record.
//!
//! # Invariants
//! - `id` and `author` are fixed at creation; only the registry mutates the
//!   remaining fields, and only through its owner-gated update path.

use crate::model::address::Address;
use serde::{Deserialize, Serialize};

/// Sequential post identifier. The first post of a registry gets `1`.
pub type PostId = u64;

/// One blog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// Opaque content-addressing key, e.g. an IPFS CID.
    pub content_hash: String,
    pub published: bool,
    /// Registry owner at the time the post was created.
    pub author: Address,
}

impl Post {
    /// Creates an unpublished post.
    pub fn new(
        id: PostId,
        title: impl Into<String>,
        content_hash: impl Into<String>,
        author: Address,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            content_hash: content_hash.into(),
            published: false,
            author,
        }
    }
}

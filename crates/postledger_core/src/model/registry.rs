//! Post registry aggregate.
//!
//! # Responsibility
//! - Own registry name, owner identity and the ordered post list.
//! - Enforce owner-gated mutation and emit notifications for post changes.
//!
//! # Invariants
//! - Post ids are `1..=n` in insertion order with no gaps.
//! - Every operation checks all preconditions before mutating, so a failed
//!   call leaves the aggregate untouched.
//! - Lookups by id use the stored id, never the list position.

use crate::model::address::Address;
use crate::model::event::RegistryEvent;
use crate::model::post::{Post, PostId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identifier of one deployed registry instance.
pub type RegistryId = Uuid;

/// Key used by a failed post lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostLookup {
    Id(PostId),
    ContentHash(String),
}

impl Display for PostLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::ContentHash(hash) => write!(f, "content hash `{hash}`"),
        }
    }
}

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Caller is not the current owner.
    Unauthorized { caller: Address, owner: Address },
    /// No post matches the lookup key.
    NotFound(PostLookup),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { caller, owner } => {
                write!(f, "caller {caller} is not the registry owner {owner}")
            }
            Self::NotFound(lookup) => write!(f, "post not found: {lookup}"),
        }
    }
}

impl Error for RegistryError {}

/// Structural problems in registry state restored from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValidationError {
    NonSequentialPostId { expected: PostId, found: PostId },
}

impl Display for RegistryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonSequentialPostId { expected, found } => {
                write!(f, "post ids must be sequential: expected {expected}, found {found}")
            }
        }
    }
}

impl Error for RegistryValidationError {}

/// Owner-gated collection of posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRegistry {
    registry_id: RegistryId,
    name: String,
    owner: Address,
    posts: Vec<Post>,
}

impl PostRegistry {
    /// Creates a fresh registry owned by `deployer`.
    pub fn deploy(name: impl Into<String>, deployer: Address) -> Self {
        Self {
            registry_id: Uuid::new_v4(),
            name: name.into(),
            owner: deployer,
            posts: Vec::new(),
        }
    }

    /// Rebuilds a registry from previously persisted parts.
    ///
    /// # Errors
    /// - `NonSequentialPostId` when `posts` ids are not exactly `1..=n`.
    pub fn from_parts(
        registry_id: RegistryId,
        name: impl Into<String>,
        owner: Address,
        posts: Vec<Post>,
    ) -> Result<Self, RegistryValidationError> {
        for (expected, post) in (1..).zip(posts.iter()) {
            if post.id != expected {
                return Err(RegistryValidationError::NonSequentialPostId {
                    expected,
                    found: post.id,
                });
            }
        }

        Ok(Self {
            registry_id,
            name: name.into(),
            owner,
            posts,
        })
    }

    pub fn registry_id(&self) -> RegistryId {
        self.registry_id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        &self.owner == caller
    }

    /// Id the next created post will receive.
    pub fn next_post_id(&self) -> PostId {
        self.posts.last().map_or(1, |post| post.id + 1)
    }

    /// Renames the registry.
    pub fn rename(
        &mut self,
        caller: &Address,
        new_name: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.ensure_owner(caller)?;
        self.name = new_name.into();
        Ok(())
    }

    /// Hands mutation rights to `new_owner`. Existing posts keep their author.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), RegistryError> {
        self.ensure_owner(caller)?;
        self.owner = new_owner;
        Ok(())
    }

    /// Appends a new unpublished post authored by the current owner.
    ///
    /// Returns the stored post and its `PostCreated` notification.
    pub fn create_post(
        &mut self,
        caller: &Address,
        title: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> Result<(Post, RegistryEvent), RegistryError> {
        self.ensure_owner(caller)?;

        let post = Post::new(
            self.next_post_id(),
            title,
            content_hash,
            self.owner.clone(),
        );
        let event = RegistryEvent::PostCreated {
            id: post.id,
            title: post.title.clone(),
            content_hash: post.content_hash.clone(),
        };
        self.posts.push(post.clone());
        Ok((post, event))
    }

    /// Replaces title, content hash and publish flag of post `id`.
    ///
    /// Ownership is checked before existence, so a non-owner never learns
    /// whether an id exists.
    pub fn update_post(
        &mut self,
        caller: &Address,
        id: PostId,
        title: impl Into<String>,
        content_hash: impl Into<String>,
        published: bool,
    ) -> Result<RegistryEvent, RegistryError> {
        self.ensure_owner(caller)?;

        let post = self
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RegistryError::NotFound(PostLookup::Id(id)))?;
        post.title = title.into();
        post.content_hash = content_hash.into();
        post.published = published;

        Ok(RegistryEvent::PostUpdated {
            id: post.id,
            title: post.title.clone(),
            content_hash: post.content_hash.clone(),
            published: post.published,
        })
    }

    /// Returns the first post whose content hash equals `content_hash`.
    pub fn fetch_by_hash(&self, content_hash: &str) -> Result<&Post, RegistryError> {
        self.posts
            .iter()
            .find(|post| post.content_hash == content_hash)
            .ok_or_else(|| {
                RegistryError::NotFound(PostLookup::ContentHash(content_hash.to_string()))
            })
    }

    /// Returns the post with stored id `id`.
    pub fn fetch_by_id(&self, id: PostId) -> Result<&Post, RegistryError> {
        self.posts
            .iter()
            .find(|post| post.id == id)
            .ok_or(RegistryError::NotFound(PostLookup::Id(id)))
    }

    /// All posts in creation order.
    pub fn fetch_all(&self) -> &[Post] {
        &self.posts
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), RegistryError> {
        if self.is_owner(caller) {
            return Ok(());
        }
        Err(RegistryError::Unauthorized {
            caller: caller.clone(),
            owner: self.owner.clone(),
        })
    }
}

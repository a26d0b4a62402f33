//! Domain model for the post registry.
//!
//! # Responsibility
//! - Define the canonical registry aggregate and its post records.
//! - Define caller identities and the notifications emitted on change.
//!
//! # Invariants
//! - Every post is identified by a sequential `PostId` starting at 1.
//! - Posts are never removed; mutation happens in place by id.
//! - All mutating operations are gated on the registry owner.

pub mod address;
pub mod event;
pub mod post;
pub mod registry;

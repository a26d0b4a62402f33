//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for registry state.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `NotDeployed`) in
//!   addition to DB transport errors.

pub mod registry_repo;

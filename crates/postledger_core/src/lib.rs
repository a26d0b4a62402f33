//! Core domain logic for postledger.
//!
//! An owner-gated blog post registry: one aggregate holding a name, an owner
//! and an append-only list of posts, persisted in SQLite and driven through
//! `RegistryService`.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{
    default_log_level, init_logging, logging_status, LogConfig, LoggingError,
};
pub use model::address::{Address, AddressError};
pub use model::event::{LogSink, NotificationSink, RegistryEvent};
pub use model::post::{Post, PostId};
pub use model::registry::{
    PostLookup, PostRegistry, RegistryError, RegistryId, RegistryValidationError,
};
pub use repo::registry_repo::{
    RegistryRepository, RepoError, RepoResult, SqliteRegistryRepository,
};
pub use service::registry_service::{RegistryService, ServiceError, ServiceResult};

/// Minimal health-check API behind the CLI `ping` command.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

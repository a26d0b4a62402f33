//! Registry use-case service.
//!
//! # Responsibility
//! - Deploy a registry into a database and run owner-gated operations on it.
//! - Forward post notifications to a `NotificationSink` after commit.
//!
//! # Invariants
//! - Every write runs load -> apply -> persist inside one immediate SQLite
//!   transaction; any error rolls the whole operation back.
//! - Sinks only observe events of committed operations.
//! - Logs carry ids, durations and error codes only.

use crate::model::address::Address;
use crate::model::event::{NotificationSink, RegistryEvent};
use crate::model::post::{Post, PostId};
use crate::model::registry::{PostLookup, PostRegistry, RegistryError};
use crate::repo::registry_repo::{RegistryRepository, RepoError, SqliteRegistryRepository};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for registry use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Authorization or lookup failure from the aggregate.
    Registry(RegistryError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Database holds no registry yet.
    NotDeployed,
    /// Database already holds a registry.
    AlreadyDeployed,
}

impl ServiceError {
    /// Stable machine-readable code used in logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Registry(RegistryError::Unauthorized { .. }) => "unauthorized",
            Self::Registry(RegistryError::NotFound(_)) => "not_found",
            Self::Repo(_) => "storage",
            Self::NotDeployed => "not_deployed",
            Self::AlreadyDeployed => "already_deployed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::NotDeployed => write!(f, "no registry is deployed in this database"),
            Self::AlreadyDeployed => write!(f, "a registry is already deployed in this database"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::Registry(RegistryError::NotFound(PostLookup::Id(id))),
            RepoError::AlreadyDeployed => Self::AlreadyDeployed,
            RepoError::NotDeployed => Self::NotDeployed,
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Registry facade over one database connection.
pub struct RegistryService<'conn, S: NotificationSink> {
    conn: &'conn mut Connection,
    sink: S,
}

impl<'conn, S: NotificationSink> RegistryService<'conn, S> {
    /// Creates a service over a migrated connection (see `db::open_db`).
    pub fn new(conn: &'conn mut Connection, sink: S) -> Self {
        Self { conn, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Deploys a new registry owned by `deployer`.
    ///
    /// # Errors
    /// - `AlreadyDeployed` when this database already holds a registry.
    pub fn deploy(
        &mut self,
        name: impl Into<String>,
        deployer: Address,
    ) -> ServiceResult<PostRegistry> {
        let registry = PostRegistry::deploy(name, deployer);
        self.write("registry_deploy", |repo| {
            repo.insert_registry(&registry)?;
            Ok(())
        })?;
        info!(
            "event=registry_deploy module=service status=ok registry_id={}",
            registry.registry_id()
        );
        Ok(registry)
    }

    /// Creates a post as `caller` and returns the stored record.
    pub fn create_post(
        &mut self,
        caller: &Address,
        title: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> ServiceResult<Post> {
        let title = title.into();
        let content_hash = content_hash.into();
        let (post, event) = self.write("post_create", |repo| {
            let mut registry = load_deployed(repo)?;
            let (post, event) = registry.create_post(caller, title, content_hash)?;
            repo.insert_post(&post)?;
            Ok((post, event))
        })?;
        self.emit(&event);
        Ok(post)
    }

    /// Updates post `id` as `caller` and returns the stored record.
    pub fn update_post(
        &mut self,
        caller: &Address,
        id: PostId,
        title: impl Into<String>,
        content_hash: impl Into<String>,
        published: bool,
    ) -> ServiceResult<Post> {
        let title = title.into();
        let content_hash = content_hash.into();
        let (post, event) = self.write("post_update", |repo| {
            let mut registry = load_deployed(repo)?;
            let event = registry.update_post(caller, id, title, content_hash, published)?;
            let post = registry.fetch_by_id(id)?.clone();
            repo.update_post(&post)?;
            Ok((post, event))
        })?;
        self.emit(&event);
        Ok(post)
    }

    pub fn rename(&mut self, caller: &Address, new_name: impl Into<String>) -> ServiceResult<()> {
        let new_name = new_name.into();
        self.write("registry_rename", |repo| {
            let mut registry = load_deployed(repo)?;
            registry.rename(caller, new_name)?;
            repo.set_name(registry.name())?;
            Ok(())
        })
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> ServiceResult<()> {
        self.write("registry_transfer", |repo| {
            let mut registry = load_deployed(repo)?;
            registry.transfer_ownership(caller, new_owner)?;
            repo.set_owner(registry.owner())?;
            Ok(())
        })
    }

    /// Loads the deployed registry.
    pub fn registry(&self) -> ServiceResult<PostRegistry> {
        load_deployed(&SqliteRegistryRepository::new(&*self.conn))
    }

    pub fn name(&self) -> ServiceResult<String> {
        Ok(self.registry()?.name().to_string())
    }

    pub fn owner(&self) -> ServiceResult<Address> {
        Ok(self.registry()?.owner().clone())
    }

    /// All posts in creation order.
    pub fn fetch_posts(&self) -> ServiceResult<Vec<Post>> {
        Ok(self.registry()?.fetch_all().to_vec())
    }

    /// First post whose content hash equals `content_hash`.
    pub fn fetch_post_by_hash(&self, content_hash: &str) -> ServiceResult<Post> {
        Ok(self.registry()?.fetch_by_hash(content_hash)?.clone())
    }

    pub fn fetch_post(&self, id: PostId) -> ServiceResult<Post> {
        Ok(self.registry()?.fetch_by_id(id)?.clone())
    }

    fn write<T>(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&SqliteRegistryRepository<'_>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = apply(&SqliteRegistryRepository::new(&tx));
        let outcome = match result {
            Ok(value) => tx.commit().map(|()| value).map_err(ServiceError::from),
            // Dropping `tx` rolls back.
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(_) => info!(
                "event={} module=service status=ok duration_ms={}",
                operation,
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event={} module=service status=error duration_ms={} error_code={}",
                operation,
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }

        outcome
    }

    fn emit(&mut self, event: &RegistryEvent) {
        self.sink.notify(event);
    }
}

fn load_deployed(repo: &impl RegistryRepository) -> ServiceResult<PostRegistry> {
    repo.load_registry()?.ok_or(ServiceError::NotDeployed)
}

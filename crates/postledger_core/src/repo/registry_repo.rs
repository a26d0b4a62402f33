//! Registry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Load and store the single registry held by one database.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - At most one registry row exists (`registry.slot = 1`).
//! - Read paths reject malformed persisted state instead of masking it.
//! - Post rows are written with ids chosen by the aggregate.

use crate::db::DbError;
use crate::model::address::Address;
use crate::model::post::{Post, PostId};
use crate::model::registry::{PostRegistry, RegistryValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const POST_SELECT_SQL: &str = "SELECT
    id,
    title,
    content_hash,
    published,
    author
FROM posts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for registry persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RegistryValidationError),
    Db(DbError),
    NotFound(PostId),
    InvalidData(String),
    AlreadyDeployed,
    NotDeployed,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "post not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted registry data: {message}"),
            Self::AlreadyDeployed => write!(f, "a registry is already deployed in this database"),
            Self::NotDeployed => write!(f, "no registry is deployed in this database"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryValidationError> for RepoError {
    fn from(value: RegistryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for registry state.
pub trait RegistryRepository {
    /// Stores a freshly deployed registry together with any posts it holds.
    fn insert_registry(&self, registry: &PostRegistry) -> RepoResult<()>;
    /// Loads the deployed registry, or `None` before deployment.
    fn load_registry(&self) -> RepoResult<Option<PostRegistry>>;
    fn set_name(&self, name: &str) -> RepoResult<()>;
    fn set_owner(&self, owner: &Address) -> RepoResult<()>;
    fn insert_post(&self, post: &Post) -> RepoResult<()>;
    /// Overwrites title, content hash and publish flag of an existing post.
    fn update_post(&self, post: &Post) -> RepoResult<()>;
}

/// SQLite-backed registry repository.
///
/// Accepts a plain connection or a `rusqlite::Transaction` (through deref),
/// so callers decide the atomicity boundary.
pub struct SqliteRegistryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegistryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn registry_exists(&self) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM registry WHERE slot = 1);",
            [],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_posts(&self) -> RepoResult<Vec<Post>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POST_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut posts = Vec::new();

        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }

        Ok(posts)
    }
}

impl RegistryRepository for SqliteRegistryRepository<'_> {
    fn insert_registry(&self, registry: &PostRegistry) -> RepoResult<()> {
        if self.registry_exists()? {
            return Err(RepoError::AlreadyDeployed);
        }

        self.conn.execute(
            "INSERT INTO registry (slot, registry_id, name, owner)
             VALUES (1, ?1, ?2, ?3);",
            params![
                registry.registry_id().to_string(),
                registry.name(),
                registry.owner().as_str(),
            ],
        )?;

        for post in registry.fetch_all() {
            self.insert_post(post)?;
        }

        Ok(())
    }

    fn load_registry(&self) -> RepoResult<Option<PostRegistry>> {
        let header = self
            .conn
            .query_row(
                "SELECT registry_id, name, owner FROM registry WHERE slot = 1;",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>("registry_id")?,
                        row.get::<_, String>("name")?,
                        row.get::<_, String>("owner")?,
                    ))
                },
            )
            .optional()?;

        let Some((id_text, name, owner_text)) = header else {
            return Ok(None);
        };

        let registry_id = Uuid::parse_str(&id_text).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid uuid value `{id_text}` in registry.registry_id"
            ))
        })?;
        let owner = parse_address(&owner_text, "registry.owner")?;
        let posts = self.list_posts()?;

        Ok(Some(PostRegistry::from_parts(
            registry_id,
            name,
            owner,
            posts,
        )?))
    }

    fn set_name(&self, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE registry
             SET
                name = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE slot = 1;",
            [name],
        )?;

        if changed == 0 {
            return Err(RepoError::NotDeployed);
        }

        Ok(())
    }

    fn set_owner(&self, owner: &Address) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE registry
             SET
                owner = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE slot = 1;",
            [owner.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotDeployed);
        }

        Ok(())
    }

    fn insert_post(&self, post: &Post) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO posts (
                id,
                title,
                content_hash,
                published,
                author
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id_to_db(post.id)?,
                post.title.as_str(),
                post.content_hash.as_str(),
                bool_to_int(post.published),
                post.author.as_str(),
            ],
        )?;

        Ok(())
    }

    fn update_post(&self, post: &Post) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE posts
             SET
                title = ?1,
                content_hash = ?2,
                published = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4;",
            params![
                post.title.as_str(),
                post.content_hash.as_str(),
                bool_to_int(post.published),
                id_to_db(post.id)?,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(post.id));
        }

        Ok(())
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let raw_id: i64 = row.get("id")?;
    let id = PostId::try_from(raw_id)
        .map_err(|_| RepoError::InvalidData(format!("invalid post id `{raw_id}` in posts.id")))?;

    let published = match row.get::<_, i64>("published")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid published value `{other}` in posts.published"
            )));
        }
    };

    let author_text: String = row.get("author")?;

    Ok(Post {
        id,
        title: row.get("title")?,
        content_hash: row.get("content_hash")?,
        published,
        author: parse_address(&author_text, "posts.author")?,
    })
}

fn parse_address(value: &str, column: &str) -> RepoResult<Address> {
    Address::parse(value).map_err(|err| {
        RepoError::InvalidData(format!("invalid address `{value}` in {column}: {err}"))
    })
}

fn id_to_db(id: PostId) -> RepoResult<i64> {
    i64::try_from(id).map_err(|_| RepoError::InvalidData(format!("post id {id} exceeds i64")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

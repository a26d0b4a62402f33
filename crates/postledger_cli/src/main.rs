//! postledger command-line tool.
//!
//! # Responsibility
//! - Deploy a registry into a SQLite file and run owner-gated operations.
//! - Print results as JSON so scripts can consume them.
//!
//! # Invariants
//! - Exit code is `0` on success and `1` on any error.
//! - The acting identity is always given explicitly with `--from`.

use clap::{Parser, Subcommand};
use postledger_core::db::{open_db, DbError};
use postledger_core::{
    default_log_level, init_logging, Address, AddressError, LogSink, LoggingError, PostId,
    RegistryService, ServiceError,
};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Owner-gated blog post registry
#[derive(Parser, Debug)]
#[command(name = "postledger")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Registry database file
    #[arg(long, global = true, default_value = "postledger.sqlite3")]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error); needs --log-dir
    #[arg(long, global = true, requires = "log_dir")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core ping and version
    Ping,

    /// Deploy a new registry owned by the sender
    Deploy {
        /// Initial registry name
        name: String,
        /// Deploying identity, becomes the owner
        #[arg(long)]
        from: String,
    },

    /// Create a post
    Create {
        title: String,
        /// Content hash, e.g. an IPFS CID
        hash: String,
        #[arg(long)]
        from: String,
    },

    /// Replace title, hash and publish flag of a post
    Update {
        id: PostId,
        title: String,
        hash: String,
        /// Mark the post as published
        #[arg(long)]
        published: bool,
        #[arg(long)]
        from: String,
    },

    /// Rename the registry
    Rename {
        name: String,
        #[arg(long)]
        from: String,
    },

    /// Transfer ownership to another identity
    Transfer {
        new_owner: String,
        #[arg(long)]
        from: String,
    },

    /// List all posts
    Posts,

    /// Show the first post with the given content hash
    Post { hash: String },

    /// Show registry id, name, owner and post count
    Info,
}

#[derive(Debug)]
enum CliError {
    Address(AddressError),
    Logging(LoggingError),
    Db(DbError),
    Service(ServiceError),
    Output(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address(err) => write!(f, "invalid address: {err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "failed to open registry database: {err}"),
            Self::Service(err) => write!(f, "{} ({})", err, err.code()),
            Self::Output(err) => write!(f, "failed to encode output: {err}"),
        }
    }
}

impl Error for CliError {}

impl From<AddressError> for CliError {
    fn from(value: AddressError) -> Self {
        Self::Address(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ServiceError> for CliError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

#[derive(Serialize)]
struct DeploymentRecord {
    registry_id: String,
    name: String,
    owner: String,
}

#[derive(Serialize)]
struct RegistryInfo {
    registry_id: String,
    name: String,
    owner: String,
    post_count: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let db = cli.db.as_path();
    match cli.command {
        Command::Ping => {
            println!("postledger_core ping={}", postledger_core::ping());
            println!(
                "postledger_core version={}",
                postledger_core::core_version()
            );
            Ok(())
        }
        Command::Deploy { name, from } => with_service(db, |service| {
            let registry = service.deploy(name, Address::parse(&from)?)?;
            print_json(&DeploymentRecord {
                registry_id: registry.registry_id().to_string(),
                name: registry.name().to_string(),
                owner: registry.owner().to_string(),
            })
        }),
        Command::Create { title, hash, from } => with_service(db, |service| {
            print_json(&service.create_post(&Address::parse(&from)?, title, hash)?)
        }),
        Command::Update {
            id,
            title,
            hash,
            published,
            from,
        } => with_service(db, |service| {
            let sender = Address::parse(&from)?;
            print_json(&service.update_post(&sender, id, title, hash, published)?)
        }),
        Command::Rename { name, from } => with_service(db, |service| {
            Ok(service.rename(&Address::parse(&from)?, name)?)
        }),
        Command::Transfer { new_owner, from } => with_service(db, |service| {
            let new_owner = Address::parse(&new_owner)?;
            Ok(service.transfer_ownership(&Address::parse(&from)?, new_owner)?)
        }),
        Command::Posts => with_service(db, |service| print_json(&service.fetch_posts()?)),
        Command::Post { hash } => {
            with_service(db, |service| print_json(&service.fetch_post_by_hash(&hash)?))
        }
        Command::Info => with_service(db, |service| {
            let registry = service.registry()?;
            print_json(&RegistryInfo {
                registry_id: registry.registry_id().to_string(),
                name: registry.name().to_string(),
                owner: registry.owner().to_string(),
                post_count: registry.fetch_all().len(),
            })
        }),
    }
}

/// Opens the registry database and hands a logging service to `op`.
fn with_service<T>(
    db: &Path,
    op: impl FnOnce(&mut RegistryService<'_, LogSink>) -> Result<T, CliError>,
) -> Result<T, CliError> {
    let mut conn = open_db(db)?;
    let mut service = RegistryService::new(&mut conn, LogSink);
    op(&mut service)
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Caller and owner identities.
//!
//! # Responsibility
//! - Parse and normalize `0x`-prefixed 20-byte hex addresses.
//!
//! # Invariants
//! - A constructed `Address` is always well formed and lowercase, so
//!   equality is case-insensitive with respect to the parsed input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid address regex"));

/// Identity used for ownership checks and post authorship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parses an address, trimming surrounding whitespace.
    ///
    /// # Errors
    /// - `AddressError::Empty` when input is blank.
    /// - `AddressError::Malformed` when input is not `0x` + 40 hex digits.
    pub fn parse(value: &str) -> Result<Self, AddressError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        if !ADDRESS_RE.is_match(trimmed) {
            return Err(AddressError::Malformed(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Returns the normalized lowercase form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// Address parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    Empty,
    Malformed(String),
}

impl Display for AddressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "address must not be empty"),
            Self::Malformed(value) => {
                write!(f, "address must be 0x followed by 40 hex digits, got `{value}`")
            }
        }
    }
}

impl Error for AddressError {}

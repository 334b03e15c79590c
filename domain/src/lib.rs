//! Domain library for the brand/type catalog.
//!
//! This crate holds the domain types, ports (traits), and error definitions.
//! Keep adapters and IO concerns out of this crate; the only dependency is
//! `serde` so entity names can be embedded directly in response bodies.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::SystemTime;

use serde::Serialize;

/// Maximum name length, matching the 255-character column of the catalog tables.
pub const MAX_NAME_LEN: usize = 255;

/// Which catalog table an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CatalogKind {
    Brand,
    Type,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 2] = [CatalogKind::Brand, CatalogKind::Type];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Brand => "brand",
            CatalogKind::Type => "type",
        }
    }

    /// Storage table backing this kind.
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Brand => "brands",
            CatalogKind::Type => "types",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "brand" | "brands" => Some(CatalogKind::Brand),
            "type" | "types" => Some(CatalogKind::Type),
            _ => None,
        }
    }
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display name of a brand or type. Always trimmed and non-empty.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityName(String);

impl EntityName {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        let trimmed = val.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidName("name must not be empty".into()));
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::InvalidName(format!(
                "name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(CoreError::InvalidName(
                "name contains control characters".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored brand or type row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntity {
    /// Assigned by the repository; starts at 1 and increases per table.
    pub id: u64,
    pub name: EntityName,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl CatalogEntity {
    /// A freshly created row: both timestamps equal the creation time.
    pub fn new(id: u64, name: EntityName, created_at: SystemTime) -> Self {
        Self {
            id,
            name,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Time source abstraction to make code testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Repository port for the brand and type tables.
pub trait CatalogRepository: Send + Sync {
    /// Insert a row, assigning the next id for `kind`.
    ///
    /// Returns `CoreError::AlreadyExists` when the name is taken in that table.
    fn create(
        &self,
        kind: CatalogKind,
        name: &EntityName,
        at: SystemTime,
    ) -> Result<CatalogEntity, CoreError>;

    /// All rows of `kind` in ascending id order.
    fn find_all(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, CoreError>;
}

/// Core domain errors (no external error crates to keep deps minimal).
#[derive(Debug)]
pub enum CoreError {
    InvalidName(String),
    AlreadyExists,
    Repository(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidName(msg) => write!(f, "invalid name: {}", msg),
            CoreError::AlreadyExists => write!(f, "resource already exists"),
            CoreError::Repository(msg) => write!(f, "repository error: {}", msg),
        }
    }
}

impl Error for CoreError {}

/// Return a short about/version line for the binary to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{} - catalog domain library loaded", pkg, ver)
}

pub mod adapters;
pub mod service;
pub mod validate;

//! Persistence of structures.
//!
//! A structure record is `{id, name, data, updated_at}` where `data` is the
//! serialized [`Diagram`]. The [`StructureStore`] trait is the seam every
//! backend implements:
//!
//! - [`FileStore`] keeps one JSON file per record in a local directory.
//! - [`HttpStore`] talks to the structures REST API.
//!
//! Loading an unknown id is not an error: it yields `Ok(None)`. Deleting an
//! unknown id succeeds. Saving is an upsert that refreshes `updated_at`.

mod file;
mod http;

pub use file::FileStore;
pub use http::HttpStore;

use std::{io, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use strata_core::model::Diagram;

/// Errors raised by a [`StructureStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed structure record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("Server responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid structure id `{0}`: only letters, digits, `-` and `_` are allowed")]
    InvalidId(String),
}

/// One entry of a structure listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSummary {
    pub id: String,
    pub name: String,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A full stored structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub id: String,
    pub name: String,
    pub data: Diagram,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl StructureRecord {
    pub fn summary(&self) -> StructureSummary {
        StructureSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// A keyed store of structure records.
pub trait StructureStore {
    /// Lists every stored structure, most recently updated first.
    fn list(&self) -> Result<Vec<StructureSummary>, StoreError>;

    /// Loads the record with the given id, `None` if there is none.
    fn load(&self, id: &str) -> Result<Option<StructureRecord>, StoreError>;

    /// Inserts or replaces the record with the given id.
    fn save(&self, id: &str, name: &str, data: &Diagram) -> Result<(), StoreError>;

    /// Removes the record with the given id. Unknown ids are not an error.
    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Checks that `id` is safe to embed in a file name or URL path segment.
///
/// # Examples
///
/// ```
/// # use strata::store::validate_id;
/// assert!(validate_id("0b6f2c1e-91aa-4c1d-9d59-1f1f6b1c2a3e").is_ok());
/// assert!(validate_id("../etc/passwd").is_err());
/// assert!(validate_id("").is_err());
/// ```
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// Timestamps are written as RFC 3339. Reading also accepts the
/// `YYYY-MM-DD HH:MM:SS` form of SQL `DATETIME` columns, taken as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    const SQL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, SQL_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

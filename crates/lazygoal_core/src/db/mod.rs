//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the goal core.
//! - Apply schema migrations in deterministic order.
//! - Resolve the database location from explicit input or environment.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Environment variable overriding the default database file location.
pub const DB_PATH_ENV: &str = "LAZYGOAL_DB_PATH";
/// File name used under the temp directory when nothing else is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "lazygoal.sqlite3";

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::CreateDirectory { path, source } => write!(
                f,
                "failed to create database directory `{}`: {source}",
                path.display()
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::CreateDirectory { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Resolves the database path.
///
/// Precedence: non-blank `explicit` value, then non-blank
/// `LAZYGOAL_DB_PATH`, then `<temp>/lazygoal.sqlite3`.
pub fn resolve_db_path(explicit: Option<&str>) -> PathBuf {
    let from_env = std::env::var(DB_PATH_ENV).ok();
    resolve_db_path_from(explicit, from_env.as_deref())
}

fn resolve_db_path_from(explicit: Option<&str>, from_env: Option<&str>) -> PathBuf {
    [explicit, from_env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::{resolve_db_path_from, DEFAULT_DB_FILE_NAME};
    use std::path::PathBuf;

    #[test]
    fn explicit_path_wins_over_environment() {
        let path = resolve_db_path_from(Some("/data/goals.db"), Some("/env/goals.db"));
        assert_eq!(path, PathBuf::from("/data/goals.db"));
    }

    #[test]
    fn blank_values_fall_through_to_temp_default() {
        let path = resolve_db_path_from(Some("  "), Some(""));
        assert_eq!(path, std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
    }

    #[test]
    fn environment_used_when_no_explicit_path() {
        let path = resolve_db_path_from(None, Some(" /env/goals.db "));
        assert_eq!(path, PathBuf::from("/env/goals.db"));
    }
}

//! Key-value persistence medium for whole-collection payloads.
//!
//! # Responsibility
//! - Store opaque string values under string keys.
//! - Provide a read-modify-write primitive the goal store builds on.
//!
//! # Invariants
//! - `update_item` either writes the closure's value or writes nothing.
//! - The SQLite medium serializes `update_item` callers with an immediate
//!   transaction, so concurrent mutations cannot lose each other's writes.

use crate::db::DbError;
use crate::model::goal::{GoalId, GoalValidationError};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for storage-medium access and goal store operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(GoalValidationError),
    Db(DbError),
    Serialization(serde_json::Error),
    NotFound(GoalId),
    InvalidData(String),
}

impl StoreError {
    /// Stable machine-readable code used in log lines and FFI messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "goal_invalid",
            Self::Db(_) => "storage_failed",
            Self::Serialization(_) => "encode_failed",
            Self::NotFound(_) => "goal_not_found",
            Self::InvalidData(_) => "payload_corrupt",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "failed to encode goals: {err}"),
            Self::NotFound(id) => write!(f, "goal not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted goal data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<GoalValidationError> for StoreError {
    fn from(value: GoalValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Device-local key-value medium.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Reads `key`, lets `f` compute the replacement, then writes it.
    ///
    /// When `f` fails nothing is written and its error is returned.
    /// The default implementation is not atomic; media that can be shared
    /// between writers should override it.
    fn update_item<T, F>(&self, key: &str, f: F) -> StoreResult<T>
    where
        F: FnOnce(Option<String>) -> StoreResult<(String, T)>,
    {
        let current = self.get_item(key)?;
        let (next, output) = f(current)?;
        self.set_item(key, &next)?;
        Ok(output)
    }
}

/// SQLite-backed medium over the `kv_store` table.
pub struct SqliteKeyValueStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueStore<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - Returns [`StoreError::InvalidData`] when the `kv_store` table is
    ///   missing, i.e. the connection was not opened through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_store'
            );",
            [],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StoreError::InvalidData(
                "kv_store table missing; open the database with db::open_db".to_string(),
            ));
        }
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKeyValueStore<'_> {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        read_value(self.conn, key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        write_value(self.conn, key, value)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn update_item<T, F>(&self, key: &str, f: F) -> StoreResult<T>
    where
        F: FnOnce(Option<String>) -> StoreResult<(String, T)>,
    {
        // Dropping `tx` on an early return rolls back.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = read_value(&tx, key)?;
        let (next, output) = f(current)?;
        write_value(&tx, key, &next)?;
        tx.commit()?;
        Ok(output)
    }
}

fn read_value(conn: &Connection, key: &str) -> StoreResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM kv_store WHERE key = ?1;",
            [key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

fn write_value(conn: &Connection, key: &str, value: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        params![key, value],
    )?;
    Ok(())
}

/// In-process medium for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

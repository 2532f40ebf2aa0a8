//! Record store: executes parameterized statements against the relational
//! backend. It knows nothing about songs beyond the schema it bootstraps;
//! statement composition lives in [`crate::songs`].

mod schema;
mod sqlite_store;

pub use schema::{SONGS_TABLE, SONGS_VERSIONED_SCHEMAS};
pub use sqlite_store::SqliteRecordStore;

use std::time::Instant;
use thiserror::Error;

/// A value bound to a positional placeholder or read back from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Statement text plus its positional arguments (`?1`, `?2`, ...).
/// User-supplied values only ever travel in `params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// One result row, columns in select-list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    fn value(&self, column: usize) -> Result<&SqlValue, StoreError> {
        self.values.get(column).ok_or_else(|| StoreError::Decode {
            column,
            reason: format!("row has only {} columns", self.values.len()),
        })
    }

    pub fn integer(&self, column: usize) -> Result<i64, StoreError> {
        match self.value(column)? {
            SqlValue::Integer(value) => Ok(*value),
            other => Err(StoreError::Decode {
                column,
                reason: format!("expected integer, got {:?}", other),
            }),
        }
    }

    pub fn text(&self, column: usize) -> Result<String, StoreError> {
        match self.value(column)? {
            SqlValue::Text(value) => Ok(value.clone()),
            other => Err(StoreError::Decode {
                column,
                reason: format!("expected text, got {:?}", other),
            }),
        }
    }
}

/// Result of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub affected_rows: usize,
    /// Rowid of the most recent successful insert on the write connection.
    pub last_insert_id: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Statement aborted: deadline exceeded")]
    Interrupted,

    #[error("Failed to decode column {column}: {reason}")]
    Decode { column: usize, reason: String },

    #[error("Connection unavailable: {0}")]
    Connection(String),
}

/// Capability interface over the relational backend.
///
/// Both calls must give up on the backend once `deadline` passes and report
/// [`StoreError::Interrupted`].
pub trait RecordStore: Send + Sync {
    /// Runs a read statement and returns every row.
    fn query(&self, statement: &Statement, deadline: Instant) -> Result<Vec<Row>, StoreError>;

    /// Runs a write statement and reports how many rows it touched.
    fn execute(&self, statement: &Statement, deadline: Instant)
        -> Result<WriteOutcome, StoreError>;
}

//! SQLite-backed record store.
//!
//! Reads are spread over a small pool of read-only connections, writes go
//! through a single connection. Every statement runs with a progress handler
//! armed with the caller's deadline, so a slow statement is aborted inside
//! SQLite rather than merely abandoned.

use super::schema::SONGS_VERSIONED_SCHEMAS;
use super::{RecordStore, Row, SqlValue, Statement, StoreError, WriteOutcome};
use crate::sqlite_persistence::create_or_migrate;
use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, OpenFlags, ToSql};
use std::ffi::c_int;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Number of SQLite VM instructions between two deadline checks.
const PROGRESS_HANDLER_OPS: c_int = 1_000;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            SqlValue::Integer(value) => ToSqlOutput::Borrowed(ValueRef::Integer(*value)),
            SqlValue::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
        })
    }
}

fn decode_value(column: usize, value: ValueRef<'_>) -> Result<SqlValue, StoreError> {
    match value {
        ValueRef::Null => Ok(SqlValue::Null),
        ValueRef::Integer(value) => Ok(SqlValue::Integer(value)),
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map(SqlValue::Text)
            .map_err(|err| StoreError::Decode {
                column,
                reason: err.to_string(),
            }),
        ValueRef::Real(_) | ValueRef::Blob(_) => Err(StoreError::Decode {
            column,
            reason: format!("unsupported column type {}", value.data_type()),
        }),
    }
}

fn classify(err: rusqlite::Error) -> StoreError {
    if err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) {
        StoreError::Interrupted
    } else {
        StoreError::Sqlite(err)
    }
}

/// Registers `fold_case(text)`, a Unicode-aware lowercase. SQLite's builtin
/// `lower()` only folds ASCII.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|value| value.to_lowercase()))
        },
    )
}

/// Arms the progress handler for the duration of one statement and disarms
/// it on drop, including on early returns.
struct DeadlineGuard<'a> {
    conn: &'a Connection,
}

impl<'a> DeadlineGuard<'a> {
    fn arm(conn: &'a Connection, deadline: Instant) -> Result<Self, StoreError> {
        if Instant::now() >= deadline {
            return Err(StoreError::Interrupted);
        }
        conn.progress_handler(
            PROGRESS_HANDLER_OPS,
            Some(move || Instant::now() >= deadline),
        );
        Ok(Self { conn })
    }
}

impl Drop for DeadlineGuard<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
    }
}

#[derive(Clone)]
pub struct SqliteRecordStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

impl SqliteRecordStore {
    /// Opens (creating if needed) the database at `db_path`, brings its
    /// schema to the latest version and opens `read_pool_size` readers.
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open song database at {:?}", db_path))?;

        create_or_migrate(&mut write_conn, SONGS_VERSIONED_SCHEMAS, "songs")?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.busy_timeout(BUSY_TIMEOUT)?;
        register_functions(&write_conn)?;

        let song_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened song catalog with {} songs", song_count);

        let read_pool_size = read_pool_size.max(1);
        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size {
            let read_conn = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .context("Failed to open read connection")?;
            read_conn.busy_timeout(BUSY_TIMEOUT)?;
            register_functions(&read_conn)?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(Self {
            read_pool,
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
        conn.lock()
            .map_err(|_| StoreError::Connection("connection mutex poisoned".to_string()))
    }
}

impl RecordStore for SqliteRecordStore {
    fn query(&self, statement: &Statement, deadline: Instant) -> Result<Vec<Row>, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = Self::lock(&read_conn)?;
        let _deadline = DeadlineGuard::arm(&conn, deadline)?;

        let mut stmt = conn.prepare_cached(&statement.sql).map_err(classify)?;
        let column_count = stmt.column_count();
        let mut rows = stmt
            .query(params_from_iter(statement.params.iter()))
            .map_err(classify)?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(classify)? {
            let values = (0..column_count)
                .map(|column| decode_value(column, row.get_ref(column)?))
                .collect::<Result<Vec<_>, StoreError>>()?;
            result.push(Row::new(values));
        }
        debug!("query returned {} rows", result.len());
        Ok(result)
    }

    fn execute(
        &self,
        statement: &Statement,
        deadline: Instant,
    ) -> Result<WriteOutcome, StoreError> {
        let conn = Self::lock(&self.write_conn)?;
        let _deadline = DeadlineGuard::arm(&conn, deadline)?;

        let affected_rows = conn
            .prepare_cached(&statement.sql)
            .and_then(|mut stmt| stmt.execute(params_from_iter(statement.params.iter())))
            .map_err(classify)?;
        debug!("statement affected {} rows", affected_rows);

        Ok(WriteOutcome {
            affected_rows,
            last_insert_id: conn.last_insert_rowid(),
        })
    }
}

//! SQLite-backed function registry and analysis run history.
//!
//! This wraps a small SQLite database storing:
//! - `function_ranges`: the recorded `[start, end)` pairs, with a flag for
//!   heuristically derived ranges.
//! - `analysis_runs`: bookkeeping for each analysis invocation.
//!
//! [`RangeDb`] implements [`FunctionRegistry`], so an export writes straight
//! into the database with the same remove-then-add contract the in-memory
//! registry follows.

use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::model::FunctionRange;
use crate::registry::{FunctionRegistry, RegistryError};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for range database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    ///
    /// This is intentionally explicit so callers can surface a clear message
    /// instead of silently clobbering or misinterpreting data.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for RegistryError {
    fn from(err: DbError) -> Self {
        RegistryError::Backend(err.to_string())
    }
}

/// Record describing one analysis invocation, for bookkeeping.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct AnalysisRunRecord {
    /// Human-friendly name of the analyzed binary or process.
    pub binary: String,
    /// Optional content hash for identity (e.g., SHA-256).
    pub binary_hash: Option<String>,
    /// Region base address.
    pub base: u64,
    /// Region size in bytes.
    pub size: u64,
    /// Candidates discovered by the reference scan.
    pub candidates: u64,
    /// Candidates that resolved to a full range.
    pub resolved: u64,
    pub started_at: String,
    pub finished_at: String,
}

/// SQLite-backed range database.
///
/// A thin wrapper around `rusqlite::Connection` responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Providing small, testable helpers for querying and updating records.
pub struct RangeDb {
    conn: Connection,
}

impl RangeDb {
    /// Open (or create) a range database at the given path and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// List all recorded ranges, ordered by start address.
    pub fn list_ranges(&self) -> DbResult<Vec<FunctionRange>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT start, end, heuristic
            FROM function_ranges
            ORDER BY start
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let start: i64 = row.get(0)?;
            let end: i64 = row.get(1)?;
            let heuristic: i32 = row.get(2)?;
            Ok(FunctionRange { start: start as u64, end: end as u64, heuristic: heuristic != 0 })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Insert an analysis run record and return its row id.
    pub fn insert_run(&self, record: &AnalysisRunRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO analysis_runs
                (binary, binary_hash, base, size, candidates, resolved, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.binary,
                record.binary_hash,
                record.base as i64,
                record.size as i64,
                record.candidates as i64,
                record.resolved as i64,
                record.started_at,
                record.finished_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List analysis runs, optionally filtered by binary name.
    pub fn list_runs(&self, binary: Option<&str>) -> DbResult<Vec<AnalysisRunRecord>> {
        fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisRunRecord> {
            let base: i64 = row.get(2)?;
            let size: i64 = row.get(3)?;
            let candidates: i64 = row.get(4)?;
            let resolved: i64 = row.get(5)?;
            Ok(AnalysisRunRecord {
                binary: row.get(0)?,
                binary_hash: row.get(1)?,
                base: base as u64,
                size: size as u64,
                candidates: candidates as u64,
                resolved: resolved as u64,
                started_at: row.get(6)?,
                finished_at: row.get(7)?,
            })
        }

        let mut stmt = if binary.is_some() {
            self.conn.prepare(
                r#"
                SELECT binary, binary_hash, base, size, candidates, resolved, started_at, finished_at
                FROM analysis_runs
                WHERE binary = ?1
                ORDER BY id
                "#,
            )?
        } else {
            self.conn.prepare(
                r#"
                SELECT binary, binary_hash, base, size, candidates, resolved, started_at, finished_at
                FROM analysis_runs
                ORDER BY id
                "#,
            )?
        };

        let rows = if let Some(bin) = binary {
            stmt.query_map(params![bin], map_run)?
        } else {
            stmt.query_map([], map_run)?
        };

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl FunctionRegistry for RangeDb {
    fn remove_range(&mut self, start: u64, end: u64) -> Result<(), RegistryError> {
        self.conn
            .execute(
                r#"
                DELETE FROM function_ranges
                WHERE start >= ?1 AND end <= ?2
                "#,
                params![start as i64, end as i64],
            )
            .map_err(DbError::from)?;
        Ok(())
    }

    fn add_range(&mut self, start: u64, end: u64, heuristic: bool) -> Result<(), RegistryError> {
        self.conn
            .execute(
                r#"
                INSERT INTO function_ranges (start, end, heuristic)
                VALUES (?1, ?2, ?3)
                "#,
                params![start as i64, end as i64, heuristic as i32],
            )
            .map_err(DbError::from)?;
        Ok(())
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: function_ranges table
/// - 2: add analysis_runs table
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS function_ranges (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                start     INTEGER NOT NULL,
                end       INTEGER NOT NULL,
                heuristic INTEGER NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS analysis_runs (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                binary      TEXT NOT NULL,
                binary_hash TEXT,
                base        INTEGER NOT NULL,
                size        INTEGER NOT NULL,
                candidates  INTEGER NOT NULL,
                resolved    INTEGER NOT NULL,
                started_at  TEXT NOT NULL,
                finished_at TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}

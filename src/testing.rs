//! Test utilities for database setup.
//!
//! Provides a helper that reuses the authoritative schema initialization,
//! eliminating schema duplication in test code.

use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

/// Test environment with a migrated database in a temporary directory.
///
/// The directory is kept alive for the lifetime of the environment and
/// cleaned up automatically when dropped.
pub struct TestEnv {
  /// Temporary directory (kept alive for database file persistence)
  pub temp: TempDir,
  /// Database connection with the full schema applied
  pub conn: Connection,
}

impl TestEnv {
  /// Create a test environment with a fresh, fully-migrated database.
  pub fn new() -> rusqlite::Result<Self> {
    let temp =
      TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    let db_path = temp.path().join("practice.db");
    let conn = Connection::open(&db_path)?;
    crate::db::schema::run_migrations(&conn)?;

    Ok(Self { temp, conn })
  }

  /// Get the temporary directory path for creating test files.
  pub fn path(&self) -> &Path {
    self.temp.path()
  }
}

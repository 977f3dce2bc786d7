//! Application configuration constants.
//!
//! This module centralizes all configurable values so that policy numbers
//! (retry caps, tolerance bands, batch limits) live in one place.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== Database Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
  database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
  path: Option<String>,
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
  // Load .env file if present
  let _ = dotenvy::dotenv();

  // Priority 1: config.toml
  if let Ok(contents) = std::fs::read_to_string("config.toml") {
    if let Ok(config) = toml::from_str::<AppConfig>(&contents) {
      if let Some(db) = config.database {
        if let Some(path) = db.path {
          tracing::info!("Using database from config.toml: {}", path);
          return PathBuf::from(path);
        }
      }
    }
  }

  // Priority 2: .env DATABASE_PATH
  if let Ok(path) = std::env::var("DATABASE_PATH") {
    tracing::info!("Using database from DATABASE_PATH env: {}", path);
    return PathBuf::from(path);
  }

  // Default
  let default = PathBuf::from("data/practice.db");
  tracing::info!("Using default database path: {}", default.display());
  default
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const SERVER_PORT: u16 = 3000;

/// Get the full server bind address
pub fn server_bind_addr() -> String {
  format!("{}:{}", SERVER_ADDR, SERVER_PORT)
}

// ==================== Generation Limits ====================

/// Maximum problems a single generate or publish call may produce,
/// regardless of the client-requested count
pub const MAX_PROBLEMS_PER_REQUEST: usize = 50;

/// Resample attempts per constrained parameter before the constraint is
/// declared unsatisfiable
pub const MAX_CONSTRAINT_RETRIES: usize = 20;

/// Whole-sample retries when a formula evaluates to NaN or infinity
pub const MAX_GENERATION_RETRIES: usize = 10;

/// Distractor count when a multiple-choice template does not specify one
pub const DEFAULT_DISTRACTOR_COUNT: usize = 3;

// ==================== Grading Policy ====================

/// Multiplier applied to a problem's tolerance to form the "close" band
pub const CLOSE_TOLERANCE_FACTOR: f64 = 5.0;

/// Lower bound of the "close" band, for very tight tolerances
pub const CLOSE_TOLERANCE_FLOOR: f64 = 0.05;

/// Relative error under this fraction is still counted correct
pub const RELATIVE_ERROR_CUTOFF: f64 = 0.001;

/// Minimum score percent for a session to count as passed
pub const PASS_THRESHOLD: u32 = 70;

// ==================== Identifiers ====================

/// Length of minted session and template ids
pub const ID_LENGTH: usize = 32;

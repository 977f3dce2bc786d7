use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS problem_templates (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      category TEXT NOT NULL,
      subcategory TEXT,
      difficulty TEXT NOT NULL,
      question_type TEXT NOT NULL,
      tags TEXT NOT NULL DEFAULT '[]',
      definition TEXT NOT NULL,
      is_active INTEGER NOT NULL DEFAULT 1,
      created_at TEXT NOT NULL,
      updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS practice_sessions (
      id TEXT PRIMARY KEY,
      user_id TEXT,
      config TEXT NOT NULL,
      problems TEXT NOT NULL,
      status TEXT NOT NULL,
      total_problems INTEGER NOT NULL,
      correct_answers INTEGER NOT NULL DEFAULT 0,
      score_percent INTEGER NOT NULL DEFAULT 0,
      time_spent_seconds INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL,
      completed_at TEXT
    );

    CREATE TABLE IF NOT EXISTS published_questions (
      id TEXT PRIMARY KEY,
      source TEXT NOT NULL,
      mode TEXT NOT NULL,
      question TEXT,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS answer_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      session_id TEXT NOT NULL,
      problem_id TEXT NOT NULL,
      user_answer TEXT NOT NULL,
      is_correct INTEGER NOT NULL,
      is_close INTEGER NOT NULL DEFAULT 0,
      rounding_warning TEXT,
      checked_at TEXT NOT NULL
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_templates_category ON problem_templates(category);
    CREATE INDEX IF NOT EXISTS idx_templates_active ON problem_templates(is_active);
    CREATE INDEX IF NOT EXISTS idx_sessions_status ON practice_sessions(status);
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON practice_sessions(user_id);
    CREATE INDEX IF NOT EXISTS idx_answer_logs_session ON answer_logs(session_id);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: answer logs grew close/rounding diagnostics
  add_column_if_missing(conn, "answer_logs", "is_close", "INTEGER NOT NULL DEFAULT 0")?;
  add_column_if_missing(conn, "answer_logs", "rounding_warning", "TEXT")?;

  // Migration: sessions gained elapsed-time tracking
  add_column_if_missing(conn, "practice_sessions", "time_spent_seconds", "INTEGER NOT NULL DEFAULT 0")?;

  Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  let query = format!("SELECT COUNT(*) FROM pragma_table_info('{}') WHERE name = ?1", table);
  conn
    .query_row(&query, [column], |row| row.get::<_, i64>(0))
    .map(|count| count > 0)
    .unwrap_or(false)
}

fn add_column_if_missing(conn: &Connection, table: &str, column: &str, decl: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl), [])?;
  }
  Ok(())
}

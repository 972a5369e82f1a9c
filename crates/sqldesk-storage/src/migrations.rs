//! Database migrations
//!
//! The schema version lives in SQLite's `user_version` pragma. Each step
//! runs once, in order, inside its own transaction.

use crate::Result;
use rusqlite::Connection;

/// Ordered schema steps; step `n` brings the database to version `n + 1`
const STEPS: &[(&str, &str)] = &[(
    "settings store",
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
)];

pub fn schema_version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(usize::try_from(version).unwrap_or_default())
}

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let current = schema_version(conn)?;

    for (index, (name, sql)) in STEPS.iter().enumerate().skip(current) {
        let version = index + 1;
        tracing::info!(version, step = %name, "Running migration");

        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version as i64)?;
        tx.commit()?;
    }

    Ok(())
}

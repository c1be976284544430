//! Database schema and migrations

use rusqlite::Connection;

use crate::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the database schema
///
/// # Errors
///
/// Returns error if migration fails
pub fn init(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- One setup code per voice-assistant user
        CREATE TABLE IF NOT EXISTS setup_tokens (
            user_id TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        PRAGMA user_version = 1;
        ",
    )?;

    tracing::info!("migrated to schema v1 (setup tokens)");
    Ok(())
}

fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- The web app resolves a code back to its user, so codes must be unique
        CREATE UNIQUE INDEX IF NOT EXISTS idx_setup_tokens_code ON setup_tokens(code);

        PRAGMA user_version = 2;
        ",
    )?;

    tracing::info!("migrated to schema v2 (unique setup codes)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_init() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='setup_tokens'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();
    }

    #[test]
    fn test_codes_unique() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();

        conn.execute(
            "INSERT INTO setup_tokens (user_id, code, created_at) VALUES ('a', 'ABC123', 'now')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO setup_tokens (user_id, code, created_at) VALUES ('b', 'ABC123', 'now')",
            [],
        );
        assert!(dup.is_err());
    }
}

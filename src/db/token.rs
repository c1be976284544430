//! Setup-token repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, OptionalExtension};

use super::DbPool;
use crate::security::{PersistOutcome, TokenStore};
use crate::{Error, Result};

/// A stored setup code
#[derive(Debug, Clone)]
pub struct SetupTokenRecord {
    pub user_id: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

/// `SQLite`-backed setup-token store
#[derive(Clone)]
pub struct SqliteTokenStore {
    pool: DbPool,
}

impl SqliteTokenStore {
    /// Create a new token store
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Find the full record for a user
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, user_id: &str) -> Result<Option<SetupTokenRecord>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let record = conn
            .query_row(
                "SELECT user_id, code, created_at FROM setup_tokens WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(SetupTokenRecord {
                        user_id: row.get(0)?,
                        code: row.get(1)?,
                        created_at: parse_datetime(&row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    /// Number of stored codes
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn count(&self) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM setup_tokens", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn code_for(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.find(user_id)?.map(|r| r.code))
    }

    fn insert_if_absent(&self, identity: &str, code: &str) -> Result<PersistOutcome> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let inserted = conn.execute(
            "INSERT INTO setup_tokens (user_id, code, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO NOTHING",
            [identity, code, now.as_str()],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                return Ok(PersistOutcome::CodeTaken);
            }
            Err(e) => return Err(e.into()),
        }
        drop(conn);

        // The row on record wins, whether or not this insert created it
        self.code_for(identity)?
            .map(PersistOutcome::Stored)
            .ok_or_else(|| Error::Database(format!("setup token for {identity} vanished")))
    }

    fn identity_for_code(&self, code: &str) -> Result<Option<String>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let user_id = conn
            .query_row(
                "SELECT user_id FROM setup_tokens WHERE code = ?1",
                [code],
                |row| row.get(0),
            )
            .optional()?;

        Ok(user_id)
    }
}

/// Run a pool query off the async worker threads
async fn blocking<T, F>(query: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(query)
        .await
        .map_err(|e| Error::Database(format!("database task failed: {e}")))?
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn find_token_by_identity(&self, identity: &str) -> Result<Option<String>> {
        let store = self.clone();
        let identity = identity.to_string();
        blocking(move || store.code_for(&identity)).await
    }

    async fn persist_token(&self, identity: &str, code: &str) -> Result<PersistOutcome> {
        let store = self.clone();
        let (identity, code) = (identity.to_string(), code.to_string());
        blocking(move || store.insert_if_absent(&identity, &code)).await
    }

    async fn find_identity_by_token(&self, code: &str) -> Result<Option<String>> {
        let store = self.clone();
        let code = code.to_string();
        blocking(move || store.identity_for_code(&code)).await
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    fn store() -> SqliteTokenStore {
        SqliteTokenStore::new(init_memory().unwrap())
    }

    #[tokio::test]
    async fn test_persist_and_find() {
        let store = store();

        assert_eq!(store.find_token_by_identity("user-1").await.unwrap(), None);

        let outcome = store.persist_token("user-1", "AB12CD").await.unwrap();
        assert_eq!(outcome, PersistOutcome::Stored("AB12CD".to_string()));

        assert_eq!(
            store.find_token_by_identity("user-1").await.unwrap().as_deref(),
            Some("AB12CD")
        );
        assert_eq!(
            store.find_identity_by_token("AB12CD").await.unwrap().as_deref(),
            Some("user-1")
        );
    }

    #[tokio::test]
    async fn test_second_persist_keeps_first_code() {
        let store = store();

        store.persist_token("user-1", "FIRST1").await.unwrap();
        let outcome = store.persist_token("user-1", "SECND2").await.unwrap();

        assert_eq!(outcome, PersistOutcome::Stored("FIRST1".to_string()));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_code_collision_reported() {
        let store = store();

        store.persist_token("user-1", "SAME00").await.unwrap();
        let outcome = store.persist_token("user-2", "SAME00").await.unwrap();

        assert_eq!(outcome, PersistOutcome::CodeTaken);
        assert_eq!(store.find_token_by_identity("user-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_connection() {
        let store = store();

        let (a, b, c) = tokio::join!(
            store.persist_token("user-1", "AAA111"),
            store.persist_token("user-2", "BBB222"),
            store.persist_token("user-1", "CCC333"),
        );

        let (a, c) = (a.unwrap(), c.unwrap());
        assert_eq!(a, c);
        assert!(matches!(&a, PersistOutcome::Stored(code) if code == "AAA111" || code == "CCC333"));
        assert_eq!(b.unwrap(), PersistOutcome::Stored("BBB222".to_string()));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_find_record() {
        let store = store();
        tokio_test::block_on(store.persist_token("user-1", "XYZ789")).unwrap();

        let record = store.find("user-1").unwrap().unwrap();
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.code, "XYZ789");
        assert!(record.created_at <= Utc::now());
    }
}

//! Client-side persistent storage.
//!
//! The browser build of this client kept its auth and session state in
//! localStorage; here the same keys live in a small SQLite kv table under
//! the storage path. Writes are best-effort cross-run memory, never a
//! transactional source of truth.
use anyhow::{Error, Result};
use tokio_rusqlite::Connection;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";
pub const CURRENT_SESSION_ID_KEY: &str = "current_session_id";
pub const PENDING_DOCUMENT_KEY: &str = "pending_document";

/// Opens (and initializes if needed) the client database under the
/// storage path.
pub async fn async_db(storage_path: &str) -> Result<Connection, Error> {
    let path = format!("{}/confer.db", storage_path.trim_end_matches('/'));
    let db = Connection::open(path).await?;
    db.call(|conn| {
        initialize_db(conn)?;
        Ok(())
    })
    .await?;
    Ok(db)
}

pub fn initialize_db(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;
    Ok(())
}

pub async fn kv_get(db: &Connection, key: &str) -> Result<Option<String>, Error> {
    let key = key.to_owned();
    let value = db
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?")?;
            let mut rows = stmt.query([key])?;
            let value = match rows.next()? {
                Some(row) => Some(row.get::<_, String>(0)?),
                None => None,
            };
            Ok(value)
        })
        .await?;

    Ok(value)
}

pub async fn kv_set(db: &Connection, key: &str, value: &str) -> Result<(), Error> {
    let key = key.to_owned();
    let value = value.to_owned();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (&key, &value),
        )?;
        Ok(())
    })
    .await?;

    Ok(())
}

pub async fn kv_delete(db: &Connection, key: &str) -> Result<(), Error> {
    let key = key.to_owned();
    db.call(move |conn| {
        conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    })
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = async_db(dir.path().to_str().unwrap())
            .await
            .expect("Failed to open db");
        (dir, db)
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let (_dir, db) = test_db().await;
        assert_eq!(kv_get(&db, "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (_dir, db) = test_db().await;
        kv_set(&db, ACCESS_TOKEN_KEY, "abc123").await.unwrap();
        assert_eq!(
            kv_get(&db, ACCESS_TOKEN_KEY).await.unwrap(),
            Some("abc123".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let (_dir, db) = test_db().await;
        kv_set(&db, CURRENT_SESSION_ID_KEY, "s1").await.unwrap();
        kv_set(&db, CURRENT_SESSION_ID_KEY, "s2").await.unwrap();
        assert_eq!(
            kv_get(&db, CURRENT_SESSION_ID_KEY).await.unwrap(),
            Some("s2".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, db) = test_db().await;
        kv_set(&db, PENDING_DOCUMENT_KEY, "{}").await.unwrap();
        kv_delete(&db, PENDING_DOCUMENT_KEY).await.unwrap();
        assert_eq!(kv_get(&db, PENDING_DOCUMENT_KEY).await.unwrap(), None);
    }
}

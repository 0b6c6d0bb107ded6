//! Database connection and key/value operations

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::error::StorageError;
use crate::migrations::run_migrations;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL mode so a second client instance can read while we write
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM local_store WHERE key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(StorageError::EmptyKey);
        }

        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO local_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    /// Returns true if a value was removed
    pub fn remove_value(&self, key: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM local_store WHERE key = ?1", [key])?;
            Ok(removed > 0)
        })
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.get_value(key)?.map(|v| v == "true"))
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_value(key, if value { "true" } else { "false" })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM local_store", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_value_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_value("lastUrl_42").unwrap(), None);

        db.set_value("lastUrl_42", "/pages/7").unwrap();
        db.set_value("lastUrl_42", "/feed").unwrap();
        assert_eq!(db.get_value("lastUrl_42").unwrap().as_deref(), Some("/feed"));

        assert!(db.remove_value("lastUrl_42").unwrap());
        assert!(!db.remove_value("lastUrl_42").unwrap());
        assert_eq!(db.get_value("lastUrl_42").unwrap(), None);
    }

    #[test]
    fn test_bool_values() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_bool("rememberMe").unwrap(), None);

        db.set_bool("rememberMe", true).unwrap();
        assert_eq!(db.get_bool("rememberMe").unwrap(), Some(true));

        db.set_bool("rememberMe", false).unwrap();
        assert_eq!(db.get_bool("rememberMe").unwrap(), Some(false));
    }

    #[test]
    fn test_empty_key_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.set_value("  ", "x"),
            Err(StorageError::EmptyKey)
        ));
    }

    #[test]
    fn test_clones_share_connection() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();
        db.set_value("rememberedIdentifier", "a@b.com").unwrap();
        assert_eq!(
            other.get_value("rememberedIdentifier").unwrap().as_deref(),
            Some("a@b.com")
        );
    }
}

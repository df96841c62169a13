use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::store::KeyValueStore;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read key {key}"))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                r#"
                INSERT INTO kv (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![key, value, now],
            )
            .with_context(|| format!("failed to write key {key}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_migrated() -> Database {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.migrate().expect("migrate");
        db
    }

    #[test]
    fn missing_key_reads_as_none() {
        let db = open_migrated();
        assert_eq!(db.get("theme").expect("get"), None);
    }

    #[test]
    fn set_upserts_existing_key() {
        let db = open_migrated();
        db.set("theme", "dark").expect("first set");
        db.set("theme", "light").expect("second set");
        assert_eq!(db.get("theme").expect("get").as_deref(), Some("light"));
    }

    #[test]
    fn migrate_is_idempotent() {
        let db = open_migrated();
        db.set("favorites", "[1]").expect("set");
        db.migrate().expect("second migrate");
        assert_eq!(db.get("favorites").expect("get").as_deref(), Some("[1]"));
    }
}

//! SQLite-backed store over the `kv_entries` table.

use super::{entry_size, KeyValueStore, StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};

const SIZE_SQL: &str = "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
FROM kv_entries";

/// Store over a migrated connection (see [`crate::db::open_db`]).
pub struct SqliteKeyValueStore<'conn> {
    conn: &'conn Connection,
    quota_bytes: u64,
}

impl<'conn> SqliteKeyValueStore<'conn> {
    pub fn new(conn: &'conn Connection, quota_bytes: u64) -> Self {
        Self { conn, quota_bytes }
    }

    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }
}

impl KeyValueStore for SqliteKeyValueStore<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let current = self.size_bytes()?;
        let replaced = self.get(key)?.map_or(0, |old| entry_size(key, &old));
        let needed = current - replaced + entry_size(key, value);
        if needed > self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
                needed,
                quota: self.quota_bytes,
            });
        }

        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM kv_entries;", [])?;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn size_bytes(&self) -> StoreResult<u64> {
        let size: i64 = self.conn.query_row(SIZE_SQL, [], |row| row.get(0))?;
        Ok(u64::try_from(size).unwrap_or(0))
    }
}

//! Local key-value store backing the fallback data layer.
//!
//! # Responsibility
//! - Persist string values under well-known keys, the way a browser client
//!   keeps them in local storage.
//! - Enforce a byte quota and recover from it by dropping non-auth data.
//! - Provide typed JSON helpers that tolerate corrupted entries.
//!
//! # Invariants
//! - Size is measured as the sum of `key.len() + value.len()` in bytes.
//! - Quota recovery never drops `auth_token` or `auth_user`.

mod memory;
mod sqlite;

pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;

use crate::db::DbError;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const AUTH_USER_KEY: &str = "auth_user";
pub const SUPPLIER_PROFILE_KEY: &str = "supplier_profile_v1";
pub const PURCHASE_ORDERS_KEY: &str = "purchase_orders_v1";
pub const PURCHASE_DELIVERIES_KEY: &str = "purchase_deliveries_v1";
pub const PURCHASE_BILLS_KEY: &str = "purchase_bills_v1";

/// Keys that survive quota recovery.
pub const PRESERVED_KEYS: &[&str] = &[AUTH_TOKEN_KEY, AUTH_USER_KEY];

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    QuotaExceeded { key: String, needed: u64, quota: u64 },
    Serialize(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded { key, needed, quota } => write!(
                f,
                "storage quota exceeded writing `{key}`: {needed} bytes needed, quota {quota}"
            ),
            Self::Serialize(err) => write!(f, "cannot serialize stored value: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } => None,
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// String key-value storage with a byte quota.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Fails with `QuotaExceeded` when the write would exceed the quota.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
    fn clear(&self) -> StoreResult<()>;
    /// Keys in ascending order.
    fn keys(&self) -> StoreResult<Vec<String>>;
    fn size_bytes(&self) -> StoreResult<u64>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        (**self).keys()
    }

    fn size_bytes(&self) -> StoreResult<u64> {
        (**self).size_bytes()
    }
}

/// Writes `value`; on quota overflow drops everything except the auth
/// keys and retries once.
pub fn safe_set<S: KeyValueStore + ?Sized>(store: &S, key: &str, value: &str) -> StoreResult<()> {
    match store.set(key, value) {
        Err(StoreError::QuotaExceeded { needed, quota, .. }) => {
            warn!(
                "event=store_quota module=store status=recovering key={} needed={} quota={}",
                key, needed, quota
            );
            clear_except(store, PRESERVED_KEYS)?;
            store.set(key, value)
        }
        other => other,
    }
}

/// Removes every entry whose key is not in `keep`.
pub fn clear_except<S: KeyValueStore + ?Sized>(store: &S, keep: &[&str]) -> StoreResult<()> {
    for key in store.keys()? {
        if !keep.contains(&key.as_str()) {
            store.remove(&key)?;
        }
    }
    Ok(())
}

/// Reads and decodes `key`; missing or undecodable values yield `None`.
pub fn read_json<T, S>(store: &S, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(
                "event=store_read module=store status=corrupt key={} error={}",
                key, err
            );
            Ok(None)
        }
    }
}

/// Like [`read_json`] but falls back to `T::default()`.
pub fn read_json_or_default<T, S>(store: &S, key: &str) -> StoreResult<T>
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    Ok(read_json(store, key)?.unwrap_or_default())
}

/// Encodes `value` as JSON and stores it through [`safe_set`].
pub fn write_json<T, S>(store: &S, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let encoded = serde_json::to_string(value)?;
    safe_set(store, key, &encoded)
}

pub(crate) fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

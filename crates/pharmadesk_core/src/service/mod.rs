//! Client use-case services.
//!
//! # Responsibility
//! - Implement the fallback data layer for purchase orders, deliveries,
//!   supplier bills and profiles on top of [`KeyValueStore`].
//! - Provide pure inventory, billing and report computations for the pages
//!   that read backend data.
//!
//! # Invariants
//! - Services never reach past the store trait; they work the same over
//!   SQLite and in-memory stores.
//! - Generated record ids are unique within their collection.

pub mod bill_service;
pub mod billing;
pub mod catalog;
pub mod clock;
pub mod delivery_service;
pub mod inventory;
pub mod profile_service;
pub mod purchase_service;
pub mod reports;

use crate::access::policy::AccessError;
use crate::backend::BackendError;
use crate::store::{write_json, KeyValueStore, StoreError};
use clock::Clock;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    NotFound { kind: &'static str, id: String },
    /// Status change not allowed from the record's current status.
    InvalidTransition {
        id: String,
        from: String,
        action: &'static str,
    },
    Validation(String),
    /// Stored value under `key` is not a JSON array; writing would lose it.
    UnreadableCollection { key: String },
    Store(StoreError),
    Backend(BackendError),
    Access(AccessError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} `{id}` not found"),
            Self::InvalidTransition { id, from, action } => {
                write!(f, "cannot {action} order `{id}` in status {from}")
            }
            Self::Validation(message) => write!(f, "{message}"),
            Self::UnreadableCollection { key } => write!(
                f,
                "stored `{key}` is unreadable; clear local data before writing to it"
            ),
            Self::Store(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
            Self::Access(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Backend(err) => Some(err),
            Self::Access(err) => Some(err),
            Self::NotFound { .. }
            | Self::InvalidTransition { .. }
            | Self::Validation(_)
            | Self::UnreadableCollection { .. } => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<BackendError> for ServiceError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

impl From<AccessError> for ServiceError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

/// Record kept in a JSON array under one store key.
pub(crate) trait StoredRecord: Serialize + DeserializeOwned {
    const KIND: &'static str;

    fn id(&self) -> &str;
}

enum Entry<T> {
    Record(T),
    /// Element that does not fit `T`; written back as it was read.
    Unreadable(Value),
}

/// A stored JSON array, decoded element by element.
///
/// # Invariants
/// - Elements that fail to decode are kept and saved back untouched.
/// - A stored value that is not an array is never overwritten.
pub(crate) struct Collection<T> {
    key: String,
    entries: Vec<Entry<T>>,
    unreadable_value: bool,
}

impl<T: StoredRecord> Collection<T> {
    pub(crate) fn load<S>(store: &S, key: &str) -> ServiceResult<Self>
    where
        S: KeyValueStore + ?Sized,
    {
        let mut collection = Self {
            key: key.to_string(),
            entries: Vec::new(),
            unreadable_value: false,
        };
        let Some(raw) = store.get(key)? else {
            return Ok(collection);
        };
        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!("event=collection_load module=service status=corrupt key={key} error=not_an_array");
                collection.unreadable_value = true;
                return Ok(collection);
            }
            Err(err) => {
                warn!("event=collection_load module=service status=corrupt key={key} error={err}");
                collection.unreadable_value = true;
                return Ok(collection);
            }
        };
        collection.entries = items
            .into_iter()
            .map(|item| match T::deserialize(&item) {
                Ok(record) => Entry::Record(record),
                Err(err) => {
                    warn!(
                        "event=collection_load module=service status=skipped key={} kind={} error={}",
                        key,
                        T::KIND,
                        err
                    );
                    Entry::Unreadable(item)
                }
            })
            .collect();
        Ok(collection)
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Record(record) => Some(record),
            Entry::Unreadable(_) => None,
        })
    }

    pub(crate) fn into_records(self) -> Vec<T> {
        self.entries
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Record(record) => Some(record),
                Entry::Unreadable(_) => None,
            })
            .collect()
    }

    /// True when any stored element, readable or not, carries `id`.
    pub(crate) fn contains_id(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| match entry {
            Entry::Record(record) => record.id() == id,
            Entry::Unreadable(value) => value.get("id").and_then(Value::as_str) == Some(id),
        })
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Record(record) if record.id() == id => Some(record),
            _ => None,
        })
    }

    pub(crate) fn push(&mut self, record: T) {
        self.entries.push(Entry::Record(record));
    }

    /// Id for a new record: the requested one if unused, else
    /// `<prefix>-<epoch_ms>` made unique.
    pub(crate) fn new_id(
        &self,
        requested: Option<&str>,
        prefix: &str,
        clock: &dyn Clock,
    ) -> ServiceResult<String> {
        match requested.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) if self.contains_id(id) => Err(ServiceError::Validation(format!(
                "{} `{id}` already exists",
                T::KIND
            ))),
            Some(id) => Ok(id.to_string()),
            None => Ok(unique_id(prefix, clock, |id| self.contains_id(id))),
        }
    }

    pub(crate) fn save<S>(&self, store: &S) -> ServiceResult<()>
    where
        S: KeyValueStore + ?Sized,
    {
        if self.unreadable_value {
            return Err(ServiceError::UnreadableCollection {
                key: self.key.clone(),
            });
        }
        let values = self
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Record(record) => serde_json::to_value(record),
                Entry::Unreadable(value) => Ok(value.clone()),
            })
            .collect::<Result<Vec<Value>, _>>()
            .map_err(StoreError::from)?;
        write_json(store, &self.key, &values)?;
        Ok(())
    }
}

/// Readable records under `key`.
pub(crate) fn load_all<T, S>(store: &S, key: &str) -> ServiceResult<Vec<T>>
where
    T: StoredRecord,
    S: KeyValueStore + ?Sized,
{
    Ok(Collection::load(store, key)?.into_records())
}

/// Loads the collection, applies `edit` to the record with `id` and saves.
pub(crate) fn update_one<T, S, F>(store: &S, key: &str, id: &str, edit: F) -> ServiceResult<T>
where
    T: StoredRecord + Clone,
    S: KeyValueStore + ?Sized,
    F: FnOnce(&mut T) -> ServiceResult<()>,
{
    let mut records: Collection<T> = Collection::load(store, key)?;
    let record = records.find_mut(id).ok_or_else(|| ServiceError::NotFound {
        kind: T::KIND,
        id: id.to_string(),
    })?;
    edit(record)?;
    let updated = record.clone();
    records.save(store)?;
    Ok(updated)
}

/// `<prefix>-<epoch_ms>`, suffixed `-2`, `-3`, ... while `taken` says so.
pub(crate) fn unique_id<F>(prefix: &str, clock: &dyn Clock, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = format!("{prefix}-{}", clock.now().timestamp_millis());
    if !taken(&base) {
        return base;
    }
    (2u32..)
        .map(|suffix| format!("{base}-{suffix}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

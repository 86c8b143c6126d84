use dashmap::{mapref::entry::Entry, DashMap};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to encode record '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Process-lifetime key/value store.
///
/// Nothing here survives a restart. Records are plain JSON values so any
/// serializable type can be stored under a string key.
#[derive(Debug, Default)]
pub struct MemoryDb {
    data: DashMap<String, Value>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`, or `fallback` when absent
    pub fn get(&self, key: &str, fallback: Value) -> Value {
        self.data
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or(fallback)
    }

    /// Insert or replace the value stored under `key`
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Load a typed record. A record that no longer decodes as `T` is
    /// treated as absent.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key, Value::Null);
        if value.is_null() {
            return None;
        }
        decode(key, value)
    }

    /// Save a typed record, replacing whatever was there
    pub fn save<T: Serialize>(&self, key: &str, record: &T) -> Result<(), StoreError> {
        self.set(key, encode(key, record)?);
        Ok(())
    }

    /// Read, modify and write back a typed record while holding the entry lock.
    ///
    /// A missing or undecodable record starts from `default()`. Concurrent
    /// updates of the same key are applied one after the other.
    pub fn update<T, D, F>(&self, key: &str, default: D, mutate: F) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned,
        D: FnOnce() -> T,
        F: FnOnce(&mut T),
    {
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let mut record = decode(key, entry.get().clone()).unwrap_or_else(default);
                mutate(&mut record);
                entry.insert(encode(key, &record)?);
                Ok(record)
            }
            Entry::Vacant(entry) => {
                let mut record = default();
                mutate(&mut record);
                entry.insert(encode(key, &record)?);
                Ok(record)
            }
        }
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, value)| value)
    }

    pub fn clear(&self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!("Ignoring undecodable record '{}': {}", key, e);
            None
        }
    }
}

fn encode<T: Serialize>(key: &str, record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}

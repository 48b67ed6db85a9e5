//! Keyed persistence for process-wide state.
//!
//! The catalog and session history never touch storage directly; they get an
//! `Arc<dyn Persistence>` and fully rewrite their key on every mutation.

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

pub trait Persistence: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Reads and decodes a JSON value stored under `key`.
pub fn load_json<T: DeserializeOwned>(store: &dyn Persistence, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .with_context(|| format!("stored value for '{key}' is not valid JSON")),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &dyn Persistence, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)
        .with_context(|| format!("failed to serialize value for '{key}'"))?;
    store.set(key, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_helpers_round_trip_through_memory() {
        let store = MemoryStore::new();
        save_json(&store, "names", &vec!["a", "b"]).unwrap();
        let names: Option<Vec<String>> = load_json(&store, "names").unwrap();
        assert_eq!(names, Some(vec!["a".to_string(), "b".to_string()]));

        let missing: Option<Vec<String>> = load_json(&store, "other").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn load_json_reports_garbage() {
        let store = MemoryStore::new();
        store.set("names", b"{oops").unwrap();
        let result: Result<Option<Vec<String>>> = load_json(&store, "names");
        assert!(result.is_err());
    }
}

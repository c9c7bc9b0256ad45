use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Contract of the external persistence service: collections of JSON
/// documents keyed by opaque string ids. The interaction core never calls
/// this itself; the surrounding application decides what to persist and
/// when.
pub trait DocumentStore: Send + Sync {
    /// Store a new document and return its generated id.
    fn create(&self, collection: &str, doc: Value) -> Result<String>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Documents whose top-level fields equal every `(field, value)` filter.
    fn query(&self, collection: &str, filters: &[(&str, Value)]) -> Result<Vec<Value>>;

    /// Merge `patch`'s top-level fields into an existing document. Patching
    /// a missing document is an error.
    fn update(&self, collection: &str, id: &str, patch: Value) -> Result<()>;

    /// Idempotent: deleting a missing document is a no-op.
    fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

/// In-memory `DocumentStore`, good enough for tests and demo wiring.
pub struct MemoryStore {
    collections: Mutex<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
        }
    }

    fn with_collections<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut HashMap<String, HashMap<String, Value>>) -> Result<T>,
    {
        let mut collections = self
            .collections
            .lock()
            .map_err(|e| anyhow!("store lock poisoned: {}", e))?;
        f(&mut collections)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn create(&self, collection: &str, doc: Value) -> Result<String> {
        if !doc.is_object() {
            bail!("document must be a JSON object");
        }
        let id = Uuid::new_v4().to_string();
        self.with_collections(|collections| {
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), doc);
            Ok(())
        })?;
        debug!(collection, %id, "document created");
        Ok(id)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        self.with_collections(|collections| {
            Ok(collections
                .get(collection)
                .and_then(|docs| docs.get(id))
                .cloned())
        })
    }

    fn query(&self, collection: &str, filters: &[(&str, Value)]) -> Result<Vec<Value>> {
        self.with_collections(|collections| {
            let docs = match collections.get(collection) {
                Some(docs) => docs,
                None => return Ok(Vec::new()),
            };
            Ok(docs
                .values()
                .filter(|doc| {
                    filters
                        .iter()
                        .all(|(field, expected)| doc.get(field) == Some(expected))
                })
                .cloned()
                .collect())
        })
    }

    fn update(&self, collection: &str, id: &str, patch: Value) -> Result<()> {
        let patch = match patch {
            Value::Object(map) => map,
            _ => bail!("patch must be a JSON object"),
        };
        self.with_collections(|collections| {
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| anyhow!("no document {} in {}", id, collection))?;
            let target = doc
                .as_object_mut()
                .ok_or_else(|| anyhow!("document {} is not an object", id))?;
            for (field, value) in patch {
                target.insert(field, value);
            }
            Ok(())
        })
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.with_collections(|collections| {
            if let Some(docs) = collections.get_mut(collection) {
                docs.remove(id);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_get_round_trip() {
        let store = MemoryStore::new();
        let id = store
            .create("posts", json!({"title": "hello", "score": 3}))
            .unwrap();

        let doc = store.get("posts", &id).unwrap().unwrap();
        assert_eq!(doc["title"], "hello");
        assert!(store.get("posts", "missing").unwrap().is_none());
        assert!(store.get("other", &id).unwrap().is_none());
    }

    #[test]
    fn test_create_rejects_non_objects() {
        let store = MemoryStore::new();
        assert!(store.create("posts", json!("just a string")).is_err());
    }

    #[test]
    fn test_query_filters_on_field_equality() {
        let store = MemoryStore::new();
        store
            .create("posts", json!({"community": "rust", "title": "a"}))
            .unwrap();
        store
            .create("posts", json!({"community": "rust", "title": "b"}))
            .unwrap();
        store
            .create("posts", json!({"community": "go", "title": "c"}))
            .unwrap();

        let rust = store
            .query("posts", &[("community", json!("rust"))])
            .unwrap();
        assert_eq!(rust.len(), 2);

        let none = store
            .query("posts", &[("community", json!("rust")), ("title", json!("c"))])
            .unwrap();
        assert!(none.is_empty());

        assert!(store.query("empty", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let id = store
            .create("posts", json!({"title": "old", "score": 1}))
            .unwrap();

        store
            .update("posts", &id, json!({"score": 2, "pinned": true}))
            .unwrap();
        let doc = store.get("posts", &id).unwrap().unwrap();
        assert_eq!(doc["title"], "old");
        assert_eq!(doc["score"], 2);
        assert_eq!(doc["pinned"], true);

        assert!(store.update("posts", "missing", json!({"score": 9})).is_err());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = store.create("posts", json!({"title": "bye"})).unwrap();

        store.delete("posts", &id).unwrap();
        assert!(store.get("posts", &id).unwrap().is_none());
        store.delete("posts", &id).unwrap();
        store.delete("never-existed", "nope").unwrap();
    }
}

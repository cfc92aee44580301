// src/store/memory.rs
//! Process-local document store. Backs local runs and the test suite.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use super::{Document, DocumentStore, Fields, Filter};

/// Thread-safe in-memory collections; documents iterate in id order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        let g = self.inner.read().expect("memory store lock poisoned");
        g.get(collection).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Copy of every document in `collection`.
    pub fn snapshot(&self, collection: &str) -> Vec<Document> {
        let g = self.inner.read().expect("memory store lock poisoned");
        g.get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Synchronous insert for fixtures.
    pub fn insert(&self, collection: &str, id: &str, fields: Fields) {
        let mut g = self.inner.write().expect("memory store lock poisoned");
        g.entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let g = self.inner.read().map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(g.get(collection).and_then(|docs| {
            docs.get(id).map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            })
        }))
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>> {
        let g = self.inner.read().map_err(|_| anyhow!("memory store lock poisoned"))?;
        let Some(docs) = g.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, fields)| filters.iter().all(|f| f.matches(fields)))
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut g = self.inner.write().map_err(|_| anyhow!("memory store lock poisoned"))?;
        g.entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut g = self.inner.write().map_err(|_| anyhow!("memory store lock poisoned"))?;
        if let Some(docs) = g.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

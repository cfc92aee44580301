// src/store/dedup.rs
//! Existence-checked writes.
//!
//! The check and the write are two separate store calls with no atomicity;
//! callers serialize cycles (see `ingest::scheduler`) so that two writers never
//! race on the same key.

use anyhow::{Context, Result};
use uuid::Uuid;

use super::DynStore;
use crate::ingest::types::{DedupKey, StoredRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// New document id.
    Inserted(String),
    Duplicate,
}

#[derive(Clone)]
pub struct DedupStore {
    store: DynStore,
}

impl DedupStore {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    pub async fn exists_news(&self, title: &str) -> Result<bool> {
        self.exists(&DedupKey::news(title)).await
    }

    pub async fn exists_listing(&self, title: &str, link: &str) -> Result<bool> {
        self.exists(&DedupKey::listing(title, link)).await
    }

    pub async fn exists(&self, key: &DedupKey) -> Result<bool> {
        let hits = self
            .store
            .query(key.collection(), &key.filters())
            .await
            .with_context(|| format!("dedup lookup in {}", key.collection()))?;
        Ok(!hits.is_empty())
    }

    /// Unconditional write under a fresh random id.
    pub async fn write(&self, record: &StoredRecord) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.store
            .set(record.collection(), &id, record.to_fields())
            .await
            .with_context(|| format!("writing {} into {}", record.title(), record.collection()))?;
        Ok(id)
    }

    pub async fn insert_if_absent(&self, record: &StoredRecord) -> Result<WriteOutcome> {
        if self.exists(&record.dedup_key()).await? {
            return Ok(WriteOutcome::Duplicate);
        }
        self.write(record).await.map(WriteOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{Category, Post};
    use crate::store::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    fn job(title: &str, link: &str) -> StoredRecord {
        let post = Post {
            title: title.into(),
            link: link.into(),
            ..Post::default()
        };
        StoredRecord::from_post(Category::Jobs, &post, Utc::now())
    }

    #[tokio::test]
    async fn second_insert_of_same_key_is_duplicate() {
        let mem = Arc::new(MemoryStore::new());
        let dedup = DedupStore::new(mem.clone());

        let first = dedup.insert_if_absent(&job("Dev", "https://a")).await.unwrap();
        assert!(matches!(first, WriteOutcome::Inserted(_)));
        let again = dedup.insert_if_absent(&job("Dev", "https://a")).await.unwrap();
        assert_eq!(again, WriteOutcome::Duplicate);

        // same title, other link is a different listing
        let other = dedup.insert_if_absent(&job("Dev", "https://b")).await.unwrap();
        assert!(matches!(other, WriteOutcome::Inserted(_)));

        assert_eq!(mem.len("internships_jobs"), 2);
        assert!(dedup.exists_listing("Dev", "https://b").await.unwrap());
        assert!(!dedup.exists_news("Dev").await.unwrap());
    }
}

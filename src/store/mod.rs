// src/store/mod.rs
//! Document store abstraction: collection-scoped get / query / set / delete.
//!
//! Collections are addressed by slash-separated paths, so nested
//! sub-collections look like `chat_rooms/{room}/messages`.

pub mod dedup;
pub mod firestore;
pub mod memory;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{StoreBackend, StoreCfg};

pub use dedup::{DedupStore, WriteOutcome};
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// Field map of a single document.
pub type Fields = BTreeMap<String, FieldValue>;

/// Typed field value, modelled after what the Firestore wire format can carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Ordering between values of the same kind; mixed kinds do not compare.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Double(a), FieldValue::Double(b)) => a.partial_cmp(b),
            (FieldValue::Integer(a), FieldValue::Double(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Double(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(t)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        FieldValue::Array(v.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lt,
}

/// Single-field predicate. Several filters in one query are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: FieldValue,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.to_string(),
            op: Op::Eq,
            value: value.into(),
        }
    }

    pub fn lt(field: &str, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.to_string(),
            op: Op::Lt,
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(v) = fields.get(&self.field) else {
            return false;
        };
        match self.op {
            Op::Eq => v == &self.value,
            Op::Lt => v.compare(&self.value) == Some(Ordering::Less),
        }
    }
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Documents in `collection` matching every filter (all documents when empty).
    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>>;

    /// Create or replace the document `id`.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    fn name(&self) -> &'static str;

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        self.query(collection, &[]).await
    }
}

pub type DynStore = Arc<dyn DocumentStore>;

/// Path of a sub-collection below a document.
pub fn sub_collection(parent: &str, id: &str, child: &str) -> String {
    format!("{parent}/{id}/{child}")
}

/// Build the configured store backend.
pub fn build_store(cfg: &StoreCfg, access_token: Option<&str>) -> Result<DynStore> {
    match cfg.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Firestore => {
            let store = FirestoreStore::with_base_url(
                &cfg.base_url,
                &cfg.project_id,
                access_token.map(str::to_string),
                Duration::from_secs(cfg.timeout_secs),
            )
            .context("building firestore client")?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn lt_filter_compares_same_kind_only() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let mut fields = Fields::new();
        fields.insert("timestamp".into(), FieldValue::from(t0));

        assert!(Filter::lt("timestamp", t1).matches(&fields));
        assert!(!Filter::lt("timestamp", t0).matches(&fields));
        // a string never sorts against a timestamp
        assert!(!Filter::lt("timestamp", "2099").matches(&fields));
        // missing field never matches
        assert!(!Filter::eq("title", "x").matches(&fields));
    }

    #[test]
    fn sub_collection_path() {
        assert_eq!(
            sub_collection("chat_rooms", "r1", "messages"),
            "chat_rooms/r1/messages"
        );
    }
}

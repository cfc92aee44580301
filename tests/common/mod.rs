// tests/common/mod.rs
//
// Shared fakes for the integration tests: scripted generators, a recording
// notifier and a store wrapper that can be told to fail deletes.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;

use askarg_feed::generation::TextGenerator;
use askarg_feed::ingest::types::Category;
use askarg_feed::ingest::{Pipeline, PipelineSettings, RetentionSweeper, Scheduler, SchedulerCfg};
use askarg_feed::notify::{Notifier, PushMessage};
use askarg_feed::store::{Document, DocumentStore, DynStore, Fields, Filter, MemoryStore};

#[derive(Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Never answers; only the orchestrator timeout ends it.
    Hang,
}

/// Answers per category, keyed by the category's prompt.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: HashMap<&'static str, Reply>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, reply: Reply) -> Self {
        self.replies.insert(category.prompt(), reply);
        self
    }

    pub fn text(self, category: Category, body: impl Into<String>) -> Self {
        self.with(category, Reply::Text(body.into()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(prompt) {
            Some(Reply::Text(t)) => Ok(t.clone()),
            Some(Reply::Fail(e)) => Err(anyhow!(e.clone())),
            Some(Reply::Hang) => std::future::pending().await,
            None => Ok("[]".to_string()),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Blocks every call until `release()`; `entered()` resolves once a call is in flight.
pub struct GateGenerator {
    entered: tokio::sync::Notify,
    gate: tokio::sync::Semaphore,
    entries: AtomicUsize,
}

impl GateGenerator {
    pub fn new() -> Self {
        Self {
            entered: tokio::sync::Notify::new(),
            gate: tokio::sync::Semaphore::new(0),
            entries: AtomicUsize::new(0),
        }
    }

    /// Calls that have reached the gate so far.
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }

    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.add_permits(Category::ALL.len() * 4);
    }
}

#[async_trait]
impl TextGenerator for GateGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.entries.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let permit = self.gate.acquire().await.map_err(|e| anyhow!(e))?;
        permit.forget();
        Ok("[]".to_string())
    }

    fn name(&self) -> &'static str {
        "gate"
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<PushMessage>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let n = Self::default();
        n.fail.store(true, Ordering::SeqCst);
        n
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.title).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, msg: &PushMessage) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("push rejected"));
        }
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Memory store whose deletes fail for selected ids.
pub struct FlakyStore {
    pub inner: Arc<MemoryStore>,
    fail_delete: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_delete: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.fail_delete.lock().unwrap().insert(id.to_string());
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>> {
        self.inner.query(collection, filters).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        self.inner.set(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        if self.fail_delete.lock().unwrap().contains(id) {
            return Err(anyhow!("delete refused for {id}"));
        }
        self.inner.delete(collection, id).await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// JSON array of `{title, link, summary}` items, as the model would return it.
pub fn posts_json(items: &[(&str, &str)]) -> String {
    let arr: Vec<_> = items
        .iter()
        .map(|(t, l)| json!({ "title": t, "link": l, "summary": format!("about {t}") }))
        .collect();
    serde_json::Value::Array(arr).to_string()
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        generation_timeout: Duration::from_secs(30),
        ..PipelineSettings::default()
    }
}

pub fn pipeline(
    generator: Arc<dyn TextGenerator>,
    store: DynStore,
    notifier: Arc<dyn Notifier>,
) -> Pipeline {
    Pipeline::new(generator, store, notifier, settings())
}

pub fn scheduler(
    generator: Arc<dyn TextGenerator>,
    store: DynStore,
    notifier: Arc<dyn Notifier>,
    cfg: SchedulerCfg,
) -> Scheduler {
    let sweeper = RetentionSweeper::new(store.clone());
    Scheduler::new(pipeline(generator, store, notifier), sweeper, cfg)
}

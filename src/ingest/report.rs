// src/ingest/report.rs
//! Outcome values returned by a cycle and by the retention sweeps.
//!
//! The pipeline never logs on its own; whoever drove the run decides what to
//! do with these (log, count, surface over HTTP).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::ingest::parser::PayloadShape;
use crate::ingest::types::Category;

/// Why a category produced nothing this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Generation(String),
    Timeout { secs: u64 },
    EmptyContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NotificationOutcome {
    /// No device token was supplied.
    NoToken,
    /// Nothing new was written.
    NothingNew,
    Sent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub skipped: Option<SkipReason>,
    #[serde(skip)]
    pub shape: Option<PayloadShape>,
    pub parsed: usize,
    pub rejected: usize,
    pub selected: usize,
    pub written: usize,
    pub duplicates: Vec<String>,
    pub write_errors: Vec<String>,
    pub notification: NotificationOutcome,
}

impl CategoryReport {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            skipped: None,
            shape: None,
            parsed: 0,
            rejected: 0,
            selected: 0,
            written: 0,
            duplicates: Vec::new(),
            write_errors: Vec::new(),
            notification: NotificationOutcome::NothingNew,
        }
    }

    pub fn skipped(category: Category, reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::new(category)
        }
    }

    pub fn notified(&self) -> bool {
        self.notification == NotificationOutcome::Sent
    }

    fn log(&self) {
        let name = self.category.name();
        if let Some(reason) = &self.skipped {
            warn!(target: "ingest", category = name, reason = ?reason, "category skipped");
            return;
        }
        if matches!(
            self.shape,
            Some(PayloadShape::Malformed | PayloadShape::NotArray)
        ) {
            warn!(target: "ingest", category = name, shape = ?self.shape, "response is not a JSON array; nothing parsed");
        }
        for title in &self.duplicates {
            info!(target: "ingest", category = name, %title, "skipping duplicate");
        }
        for err in &self.write_errors {
            warn!(target: "ingest", category = name, error = %err, "record not stored");
        }
        if let NotificationOutcome::Failed(err) = &self.notification {
            warn!(target: "ingest", category = name, error = %err, "notification failed");
        }
        info!(
            target: "ingest",
            category = name,
            parsed = self.parsed,
            rejected = self.rejected,
            selected = self.selected,
            written = self.written,
            duplicates = self.duplicates.len(),
            notified = self.notified(),
            "category done"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub categories: Vec<CategoryReport>,
}

impl CycleReport {
    /// Names of categories that triggered a notification, in processing order.
    pub fn notified(&self) -> Vec<&'static str> {
        self.categories
            .iter()
            .filter(|c| c.notified())
            .map(|c| c.category.name())
            .collect()
    }

    /// Names of every configured category, in processing order.
    pub fn collections(&self) -> Vec<&'static str> {
        self.categories.iter().map(|c| c.category.name()).collect()
    }

    pub fn written(&self) -> usize {
        self.categories.iter().map(|c| c.written).sum()
    }

    pub fn category(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn log(&self) {
        for c in &self.categories {
            c.log();
        }
        info!(
            target: "ingest",
            written = self.written(),
            notified = ?self.notified(),
            elapsed_ms = (self.finished_at - self.started_at).num_milliseconds(),
            "cycle finished"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub collection: String,
    /// `None` when the listing query itself failed.
    pub id: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub deleted: BTreeMap<String, usize>,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn total_deleted(&self) -> usize {
        self.deleted.values().sum()
    }

    pub fn record_deleted(&mut self, collection: &str) {
        *self.deleted.entry(collection.to_string()).or_default() += 1;
    }

    pub fn record_failure(&mut self, collection: &str, id: Option<&str>, error: String) {
        self.failures.push(SweepFailure {
            collection: collection.to_string(),
            id: id.map(str::to_string),
            error,
        });
    }

    pub fn log(&self, label: &str) {
        for f in &self.failures {
            warn!(
                target: "retention",
                sweep = label,
                collection = %f.collection,
                id = ?f.id,
                error = %f.error,
                "delete failed"
            );
        }
        info!(
            target: "retention",
            sweep = label,
            deleted = self.total_deleted(),
            failures = self.failures.len(),
            "sweep finished"
        );
    }
}

/// Everything one guarded run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub cycle: CycleReport,
    pub cutoff: DateTime<Utc>,
    pub content_sweep: SweepReport,
    pub chat_sweep: SweepReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepRun {
    pub cutoff: DateTime<Utc>,
    pub content_sweep: SweepReport,
    pub chat_sweep: SweepReport,
}

impl SweepRun {
    pub fn total_deleted(&self) -> usize {
        self.content_sweep.total_deleted() + self.chat_sweep.total_deleted()
    }
}

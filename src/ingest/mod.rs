// src/ingest/mod.rs
//! The fetch → parse → diversify → dedup-write → notify cycle.

pub mod diversity;
pub mod parser;
pub mod platform;
pub mod prompts;
pub mod report;
pub mod retention;
pub mod scheduler;
pub mod types;

use std::time::Duration;

use chrono::Utc;

use crate::config::FeedConfig;
use crate::generation::DynGenerator;
use crate::ingest::report::{CategoryReport, CycleReport, NotificationOutcome, SkipReason};
use crate::ingest::types::{Category, DedupKey, StoredRecord};
use crate::notify::{DynNotifier, PushMessage};
use crate::store::{DedupStore, DynStore};

pub use report::{RunReport, SweepReport, SweepRun};
pub use retention::{retention_cutoff, RetentionSweeper};
pub use scheduler::{Scheduler, SchedulerCfg};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub categories: Vec<Category>,
    pub diversity_limit: usize,
    pub generation_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            diversity_limit: diversity::DEFAULT_DIVERSITY_LIMIT,
            generation_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&FeedConfig> for PipelineSettings {
    fn from(cfg: &FeedConfig) -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            diversity_limit: cfg.pipeline.diversity_limit.max(1),
            generation_timeout: cfg.generation.timeout(),
        }
    }
}

pub struct Pipeline {
    generator: DynGenerator,
    dedup: DedupStore,
    notifier: DynNotifier,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        generator: DynGenerator,
        store: DynStore,
        notifier: DynNotifier,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            generator,
            dedup: DedupStore::new(store),
            notifier,
            settings,
        }
    }

    /// One pass over every configured category, in order.
    ///
    /// Never fails as a whole: each category's problems land in its report.
    /// A blank `notify_token` is the same as none.
    pub async fn run_cycle(&self, notify_token: Option<&str>) -> CycleReport {
        let token = notify_token.map(str::trim).filter(|t| !t.is_empty());
        let started_at = Utc::now();
        let mut categories = Vec::with_capacity(self.settings.categories.len());
        for &category in &self.settings.categories {
            categories.push(self.run_category(category, token).await);
        }
        CycleReport {
            started_at,
            finished_at: Utc::now(),
            categories,
        }
    }

    async fn run_category(&self, category: Category, token: Option<&str>) -> CategoryReport {
        let raw = match self.fetch(category).await {
            Ok(raw) => raw,
            Err(reason) => return CategoryReport::skipped(category, reason),
        };

        let mut report = CategoryReport::new(category);
        let parsed = parser::parse_detailed(&raw);
        report.shape = Some(parsed.shape);
        report.parsed = parsed.posts.len();
        report.rejected = parsed.rejected;

        let posts = if category.uses_diversity() {
            diversity::select(parsed.posts, self.settings.diversity_limit)
        } else {
            parsed.posts
        };
        report.selected = posts.len();

        for post in &posts {
            match self.dedup.exists(&DedupKey::for_post(category, post)).await {
                Ok(true) => {
                    report.duplicates.push(post.title.clone());
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    report.write_errors.push(format!("{}: {e:#}", post.title));
                    continue;
                }
            }
            let record = StoredRecord::from_post(category, post, Utc::now());
            match self.dedup.write(&record).await {
                Ok(_) => report.written += 1,
                Err(e) => report.write_errors.push(format!("{e:#}")),
            }
        }

        report.notification = self.notify(category, report.written, token).await;
        report
    }

    async fn fetch(&self, category: Category) -> Result<String, SkipReason> {
        let limit = self.settings.generation_timeout;
        match tokio::time::timeout(limit, self.generator.generate(category.prompt())).await {
            Err(_) => Err(SkipReason::Timeout {
                secs: limit.as_secs(),
            }),
            Ok(Err(e)) => Err(SkipReason::Generation(format!("{e:#}"))),
            Ok(Ok(raw)) if raw.trim().is_empty() => Err(SkipReason::EmptyContent),
            Ok(Ok(raw)) => Ok(raw),
        }
    }

    async fn notify(
        &self,
        category: Category,
        written: usize,
        token: Option<&str>,
    ) -> NotificationOutcome {
        if written == 0 {
            return NotificationOutcome::NothingNew;
        }
        let Some(token) = token else {
            return NotificationOutcome::NoToken;
        };
        let (title, body) = category.notification();
        match self.notifier.deliver(&PushMessage::new(token, title, body)).await {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => NotificationOutcome::Failed(format!("{e:#}")),
        }
    }
}

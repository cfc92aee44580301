// src/ingest/retention.rs
//! Time-based deletion of stale records.
//!
//! Retention is date-granular: the cutoff is midnight UTC of the day
//! `retention_days` before today, not a rolling window. Deletes are
//! best-effort; one failing document never stops the rest of a sweep.

use chrono::{DateTime, Days, NaiveTime, Utc};

use crate::chat::{messages_collection, CHAT_ROOMS_COLLECTION};
use crate::ingest::report::SweepReport;
use crate::ingest::types::{LISTINGS_COLLECTION, NEWS_COLLECTION};
use crate::store::{DynStore, Filter};

pub const DEFAULT_RETENTION_DAYS: u32 = 1;

/// Start of the UTC day `retention_days` before `now`'s UTC date.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    let day = now
        .date_naive()
        .checked_sub_days(Days::new(u64::from(retention_days)))
        .unwrap_or(chrono::NaiveDate::MIN);
    day.and_time(NaiveTime::MIN).and_utc()
}

pub struct RetentionSweeper {
    store: DynStore,
    collections: Vec<String>,
}

impl RetentionSweeper {
    /// Sweeper over the news and listings collections.
    pub fn new(store: DynStore) -> Self {
        Self::with_collections(store, [NEWS_COLLECTION, LISTINGS_COLLECTION])
    }

    pub fn with_collections<I, S>(store: DynStore, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            store,
            collections: collections.into_iter().map(Into::into).collect(),
        }
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Delete every record with `timestamp < cutoff` from the content collections.
    pub async fn sweep(&self, cutoff: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        for collection in &self.collections {
            self.sweep_collection(collection, cutoff, &mut report).await;
        }
        report
    }

    /// Same cutoff over `chat_rooms/{room}/messages`, room by room.
    pub async fn sweep_chat(&self, cutoff: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        let rooms = match self.store.list(CHAT_ROOMS_COLLECTION).await {
            Ok(rooms) => rooms,
            Err(e) => {
                report.record_failure(CHAT_ROOMS_COLLECTION, None, format!("{e:#}"));
                return report;
            }
        };
        for room in rooms {
            let messages = messages_collection(&room.id);
            self.sweep_collection(&messages, cutoff, &mut report).await;
        }
        report
    }

    async fn sweep_collection(
        &self,
        collection: &str,
        cutoff: DateTime<Utc>,
        report: &mut SweepReport,
    ) {
        let stale = match self
            .store
            .query(collection, &[Filter::lt("timestamp", cutoff)])
            .await
        {
            Ok(docs) => docs,
            Err(e) => {
                report.record_failure(collection, None, format!("{e:#}"));
                return;
            }
        };
        for doc in stale {
            match self.store.delete(collection, &doc.id).await {
                Ok(()) => report.record_deleted(collection),
                Err(e) => report.record_failure(collection, Some(&doc.id), format!("{e:#}")),
            }
        }
    }
}

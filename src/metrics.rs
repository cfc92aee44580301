// src/metrics.rs
use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::ingest::report::{CycleReport, NotificationOutcome, SweepReport};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_cycles_total", "Completed fetch cycles.");
        describe_counter!(
            "feed_records_written_total",
            "New records written, by category."
        );
        describe_counter!(
            "feed_duplicates_total",
            "Posts skipped because a record with the same key exists."
        );
        describe_counter!(
            "feed_category_skipped_total",
            "Categories skipped after a generation failure, timeout or empty reply."
        );
        describe_counter!(
            "feed_notifications_total",
            "Category notifications, by outcome."
        );
        describe_counter!(
            "feed_retention_deleted_total",
            "Records removed by retention sweeps."
        );
        describe_counter!(
            "feed_runs_rejected_total",
            "Runs refused because another run held the guard."
        );
        describe_gauge!("feed_last_run_ts", "Unix ts when the last cycle finished.");
    });
}

pub fn record_cycle(report: &CycleReport) {
    counter!("feed_cycles_total").increment(1);
    for c in &report.categories {
        let category = c.category.name();
        if c.skipped.is_some() {
            counter!("feed_category_skipped_total", "category" => category).increment(1);
            continue;
        }
        counter!("feed_records_written_total", "category" => category).increment(c.written as u64);
        counter!("feed_duplicates_total", "category" => category)
            .increment(c.duplicates.len() as u64);
        let outcome = match &c.notification {
            NotificationOutcome::Sent => "sent",
            NotificationOutcome::Failed(_) => "failed",
            _ => continue,
        };
        counter!("feed_notifications_total", "category" => category, "outcome" => outcome)
            .increment(1);
    }
    gauge!("feed_last_run_ts").set(report.finished_at.timestamp() as f64);
}

pub fn record_sweep(sweep: &'static str, report: &SweepReport) {
    counter!("feed_retention_deleted_total", "sweep" => sweep)
        .increment(report.total_deleted() as u64);
}

pub fn record_rejected(source: &'static str) {
    counter!("feed_runs_rejected_total", "source" => source).increment(1);
}

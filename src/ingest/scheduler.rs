// src/ingest/scheduler.rs
//! Recurring runs plus manual triggers, serialized by one guard.
//!
//! Busy policy is reject: a manual trigger that finds a run in progress gets
//! `FeedError::Busy`, a scheduled tick that finds one is skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::ingest::report::{RunReport, SweepReport, SweepRun};
use crate::ingest::retention::{retention_cutoff, RetentionSweeper};
use crate::ingest::Pipeline;
use crate::metrics as feed_metrics;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval: Duration,
    pub retention_days: u32,
    /// Prune chat messages as part of every run.
    pub sweep_chat: bool,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            retention_days: 1,
            sweep_chat: true,
        }
    }
}

impl From<&FeedConfig> for SchedulerCfg {
    fn from(cfg: &FeedConfig) -> Self {
        Self {
            interval: cfg.interval(),
            retention_days: cfg.schedule.retention_days,
            sweep_chat: cfg.schedule.sweep_chat,
        }
    }
}

struct Inner {
    pipeline: Pipeline,
    sweeper: RetentionSweeper,
    cfg: SchedulerCfg,
    guard: Arc<tokio::sync::Mutex<()>>,
    running: Arc<AtomicBool>,
}

/// Held for the whole of a run; `running` mirrors whether one exists.
struct RunPermit {
    _guard: OwnedMutexGuard<()>,
    running: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Inner {
    fn try_permit(&self) -> Option<RunPermit> {
        let guard = self.guard.clone().try_lock_owned().ok()?;
        self.running.store(true, Ordering::SeqCst);
        Some(RunPermit {
            _guard: guard,
            running: self.running.clone(),
        })
    }

    async fn sweeps(&self, with_chat: bool) -> SweepRun {
        let cutoff = retention_cutoff(Utc::now(), self.cfg.retention_days);
        let content_sweep = self.sweeper.sweep(cutoff).await;
        content_sweep.log("content");
        feed_metrics::record_sweep("content", &content_sweep);

        let chat_sweep = if with_chat {
            let s = self.sweeper.sweep_chat(cutoff).await;
            s.log("chat");
            feed_metrics::record_sweep("chat", &s);
            s
        } else {
            SweepReport::default()
        };
        SweepRun {
            cutoff,
            content_sweep,
            chat_sweep,
        }
    }

    /// Cycle, then retention. Caller must hold the guard.
    async fn run(&self, token: Option<&str>) -> RunReport {
        let cycle = self.pipeline.run_cycle(token).await;
        cycle.log();
        feed_metrics::record_cycle(&cycle);

        let sweeps = self.sweeps(self.cfg.sweep_chat).await;
        RunReport {
            cycle,
            cutoff: sweeps.cutoff,
            content_sweep: sweeps.content_sweep,
            chat_sweep: sweeps.chat_sweep,
        }
    }
}

pub struct Scheduler {
    inner: Arc<Inner>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(pipeline: Pipeline, sweeper: RetentionSweeper, cfg: SchedulerCfg) -> Self {
        Self {
            inner: Arc::new(Inner {
                pipeline,
                sweeper,
                cfg,
                guard: Arc::new(tokio::sync::Mutex::new(())),
                running: Arc::new(AtomicBool::new(false)),
            }),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    pub fn cfg(&self) -> SchedulerCfg {
        self.inner.cfg
    }

    /// True while a run holds the guard. Reading it never touches the guard.
    pub fn is_busy(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    fn acquire(&self, source: &'static str) -> Result<RunPermit, FeedError> {
        self.inner.try_permit().ok_or_else(|| {
            feed_metrics::record_rejected(source);
            FeedError::Busy
        })
    }

    /// Full run now: cycle, content sweep, chat sweep.
    ///
    /// The run is spawned while holding the guard, so it completes even when
    /// the caller goes away mid-run.
    pub async fn trigger(&self, token: Option<&str>) -> Result<RunReport, FeedError> {
        let permit = self.acquire("manual")?;
        let inner = self.inner.clone();
        let token = token.map(str::to_string);
        tokio::spawn(async move {
            let _permit = permit;
            inner.run(token.as_deref()).await
        })
        .await
        .map_err(|e| FeedError::Aborted(e.to_string()))
    }

    /// Retention sweeps only, chat included.
    pub async fn trigger_sweep(&self) -> Result<SweepRun, FeedError> {
        let permit = self.acquire("sweep")?;
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let _permit = permit;
            inner.sweeps(true).await
        })
        .await
        .map_err(|e| FeedError::Aborted(e.to_string()))
    }

    /// Spawn the recurring task; first run one interval from now.
    /// Returns false when it is already running or the scheduler was stopped.
    pub fn start(&self) -> bool {
        let Ok(mut task) = self.task.lock() else {
            return false;
        };
        if self.cancel.is_cancelled() || task.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }

        let inner = self.inner.clone();
        let cancel = self.cancel.clone();
        let period = inner.cfg.interval;
        info!(target: "scheduler", interval_secs = period.as_secs(), "scheduler started");

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        match inner.try_permit() {
                            Some(permit) => {
                                let _permit = permit;
                                inner.run(None).await;
                            }
                            None => {
                                feed_metrics::record_rejected("scheduled");
                                warn!(target: "scheduler", "previous run still in progress; tick skipped");
                            }
                        }
                    }
                }
            }
            info!(target: "scheduler", "scheduler stopped");
        }));
        true
    }

    /// Cancel future ticks and wait for the task; a run in progress finishes first.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(h) = handle {
            if let Err(e) = h.await {
                warn!(target: "scheduler", error = %e, "scheduler task ended abnormally");
            }
        }
    }
}

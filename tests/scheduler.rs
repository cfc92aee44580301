// tests/scheduler.rs
//
// Guarded runs: busy rejection, start/stop, sweeps riding along with a run,
// shutdown draining a run in progress.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use askarg_feed::ingest::types::{Category, NEWS_COLLECTION};
use askarg_feed::ingest::SchedulerCfg;
use askarg_feed::store::{FieldValue, Fields, MemoryStore};
use askarg_feed::{serve, FeedError};

use common::{posts_json, scheduler, GateGenerator, RecordingNotifier, ScriptedGenerator};

fn cfg(interval_secs: u64) -> SchedulerCfg {
    SchedulerCfg {
        interval: Duration::from_secs(interval_secs),
        ..SchedulerCfg::default()
    }
}

#[tokio::test]
async fn concurrent_trigger_is_rejected_as_busy() {
    let gate = Arc::new(GateGenerator::new());
    let sched = Arc::new(scheduler(
        gate.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
        cfg(3600),
    ));

    let first = {
        let s = sched.clone();
        tokio::spawn(async move { s.trigger(Some("t")).await })
    };
    gate.entered().await;
    assert!(sched.is_busy());

    let second = sched.trigger(None).await;
    assert!(matches!(second, Err(FeedError::Busy)));
    assert!(matches!(sched.trigger_sweep().await, Err(FeedError::Busy)));

    gate.release();
    let report = first.await.unwrap().expect("first run completes");
    assert_eq!(report.cycle.collections().len(), 3);
    assert!(!sched.is_busy());

    // guard is free again
    assert!(sched.trigger_sweep().await.is_ok());
}

#[tokio::test]
async fn trigger_runs_cycle_then_retention() {
    let mem = Arc::new(MemoryStore::new());
    let mut stale = Fields::new();
    stale.insert("title".into(), FieldValue::from("stale"));
    stale.insert(
        "timestamp".into(),
        FieldValue::from(Utc::now() - chrono::Duration::days(5)),
    );
    mem.insert(NEWS_COLLECTION, "stale", stale);

    let generator = ScriptedGenerator::new().text(
        Category::NewsArticles,
        posts_json(&[("Fresh story", "https://news.example/fresh")]),
    );
    let sched = scheduler(
        Arc::new(generator),
        mem.clone(),
        Arc::new(RecordingNotifier::new()),
        cfg(3600),
    );

    let report = sched.trigger(None).await.unwrap();

    assert_eq!(report.cycle.written(), 1);
    assert_eq!(report.content_sweep.total_deleted(), 1);
    let titles: Vec<_> = mem
        .snapshot(NEWS_COLLECTION)
        .into_iter()
        .filter_map(|d| d.str_field("title").map(str::to_string))
        .collect();
    assert_eq!(titles, ["Fresh story"]);
}

#[tokio::test(start_paused = true)]
async fn first_tick_waits_one_interval_and_stop_ends_ticks() {
    let generator = Arc::new(ScriptedGenerator::new());
    let sched = scheduler(
        generator.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
        cfg(60),
    );

    assert!(sched.start());
    assert!(!sched.start(), "second start is a no-op");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(generator.calls(), 0);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(generator.calls(), 3);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(generator.calls(), 6);

    sched.stop().await;
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(generator.calls(), 6);
    assert!(!sched.start(), "stopped scheduler does not restart");
}

#[tokio::test(start_paused = true)]
async fn tick_during_manual_run_is_skipped() {
    let gate = Arc::new(GateGenerator::new());
    let sched = Arc::new(scheduler(
        gate.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
        cfg(20),
    ));
    assert!(sched.start());

    let manual = {
        let s = sched.clone();
        tokio::spawn(async move { s.trigger(None).await })
    };
    gate.entered().await;

    // tick at 20s lands while the manual run is parked on its first category
    tokio::time::sleep(Duration::from_secs(21)).await;
    assert_eq!(gate.entries(), 1);
    assert!(sched.is_busy());

    gate.release();
    manual.await.unwrap().expect("manual run completes");
    sched.stop().await;

    // only the manual run's three categories; the tick never queued a run
    assert_eq!(gate.entries(), 3);
    assert!(!sched.is_busy());
}

#[tokio::test(start_paused = true)]
async fn stop_lets_in_flight_scheduled_run_finish() {
    let gate = Arc::new(GateGenerator::new());
    let sched = Arc::new(scheduler(
        gate.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
        cfg(60),
    ));
    assert!(sched.start());
    gate.entered().await;

    let stopper = {
        let s = sched.clone();
        tokio::spawn(async move { s.stop().await })
    };
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!stopper.is_finished(), "stop waits for the run");
    assert!(sched.is_busy());

    gate.release();
    stopper.await.unwrap();
    assert_eq!(gate.entries(), 3);
    assert!(!sched.is_busy());
}

#[tokio::test(start_paused = true)]
async fn serve_drains_in_flight_run_on_shutdown() {
    let gate = Arc::new(GateGenerator::new());
    let sched = Arc::new(scheduler(
        gate.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
        cfg(60),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, Router::new(), sched.clone(), async move {
        let _ = rx.await;
    }));

    gate.entered().await;
    tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!server.is_finished(), "shutdown waits for the scheduled run");

    gate.release();
    server.await.unwrap().expect("server exits cleanly");
    assert_eq!(gate.entries(), 3);
    assert!(!sched.is_busy());
    assert!(!sched.start(), "scheduler is stopped after serve returns");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn polling_is_busy_never_rejects_a_trigger() {
    let sched = Arc::new(scheduler(
        Arc::new(ScriptedGenerator::new()),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
        cfg(3600),
    ));
    let done = Arc::new(AtomicBool::new(false));
    let poller = {
        let s = sched.clone();
        let done = done.clone();
        tokio::spawn(async move {
            while !done.load(Ordering::SeqCst) {
                let _ = s.is_busy();
                tokio::task::yield_now().await;
            }
        })
    };

    for _ in 0..200 {
        assert!(sched.trigger(None).await.is_ok());
    }
    done.store(true, Ordering::SeqCst);
    poller.await.unwrap();
}

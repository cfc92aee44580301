// src/app.rs
//! Wiring: config → collaborators → pipeline, scheduler, HTTP state.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{self, AppState};
use crate::chat::ChatNotifier;
use crate::config::FeedConfig;
use crate::generation::{build_generator, DynGenerator};
use crate::ingest::{Pipeline, PipelineSettings, RetentionSweeper, Scheduler, SchedulerCfg};
use crate::notify::{build_notifier, DynNotifier};
use crate::store::{build_store, DynStore};

#[derive(Clone)]
pub struct Services {
    pub scheduler: Arc<Scheduler>,
    pub store: DynStore,
    pub notifier: DynNotifier,
    pub chat: ChatNotifier,
}

impl Services {
    /// Build from already-constructed collaborators.
    pub fn from_parts(
        cfg: &FeedConfig,
        generator: DynGenerator,
        store: DynStore,
        notifier: DynNotifier,
    ) -> Self {
        let pipeline = Pipeline::new(
            generator,
            store.clone(),
            notifier.clone(),
            PipelineSettings::from(cfg),
        );
        let sweeper = RetentionSweeper::new(store.clone());
        let scheduler = Arc::new(Scheduler::new(pipeline, sweeper, SchedulerCfg::from(cfg)));
        Self {
            scheduler,
            chat: ChatNotifier::new(store.clone(), notifier.clone()),
            store,
            notifier,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            scheduler: self.scheduler.clone(),
            notifier: self.notifier.clone(),
            chat: self.chat.clone(),
        }
    }

    pub fn router(&self) -> Router {
        api::router(self.app_state())
    }
}

/// Build every collaborator the config asks for.
pub fn build_services(cfg: &FeedConfig) -> Result<Services> {
    let generator = build_generator(&cfg.generation).context("generation backend")?;
    let store = build_store(&cfg.store, cfg.google_access_token.as_deref()).context("document store")?;
    let notifier = build_notifier(cfg).context("notifier")?;
    info!(
        target: "app",
        generator = generator.name(),
        store = store.name(),
        notifier = notifier.name(),
        interval_secs = cfg.schedule.interval_secs,
        "services built"
    );
    Ok(Services::from_parts(cfg, generator, store, notifier))
}

/// Start the scheduler, serve `router` until `shutdown` resolves, then stop
/// the scheduler. A run in progress at shutdown completes before this returns.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    scheduler: Arc<Scheduler>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    scheduler.start();
    if let Ok(addr) = listener.local_addr() {
        info!(target: "app", %addr, "listening");
    }

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server");

    info!(target: "app", "draining scheduler");
    scheduler.stop().await;
    served
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(target: "app", error = %e, "ctrl-c listener failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(target: "app", error = %e, "SIGTERM listener failed");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(target: "app", "shutdown signal received");
}

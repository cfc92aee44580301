// src/lib.rs
// Public library surface shared by the binaries and integration tests.

pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod store;

pub use crate::api::{router, AppState};
pub use crate::app::{build_services, serve, shutdown_signal, Services};
pub use crate::config::FeedConfig;
pub use crate::error::FeedError;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG` (default `info,hyper=warn,reqwest=warn`); JSON lines
/// when `FEED_LOG_JSON=1`, compact text otherwise. A second call is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    let json = std::env::var("FEED_LOG_JSON").is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

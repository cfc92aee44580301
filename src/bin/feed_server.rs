//! Standalone runner: serves the HTTP surface and the scheduler on
//! `FEED_BIND_ADDR` (default `0.0.0.0:8000`) and owns SIGTERM/SIGINT, so a
//! run in progress at shutdown completes before the process exits.

use anyhow::Context;
use askarg_feed::{build_services, init_tracing, metrics::Metrics, serve, shutdown_signal, FeedConfig};
use tracing::warn;

const ENV_BIND_ADDR: &str = "FEED_BIND_ADDR";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = FeedConfig::load()?;
    let services = build_services(&cfg)?;

    let mut router = services.router();
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => warn!(target: "app", error = %format!("{e:#}"), "metrics disabled"),
    }

    let addr = std::env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    serve(listener, router, services.scheduler.clone(), shutdown_signal()).await
}

//! Askarg feed service: Shuttle entrypoint.
//! Boots the scheduler and the Axum HTTP surface under the Shuttle runtime.
//!
//! The Shuttle runtime owns SIGTERM/SIGINT and drops `bind` on either, so a
//! run in progress is not drained here. `feed_server` is the runner that
//! drains it.

use std::net::SocketAddr;

use anyhow::Context;
use askarg_feed::{build_services, init_tracing, metrics::Metrics, serve, FeedConfig, Services};
use tracing::warn;

pub struct FeedService {
    services: Services,
    metrics: Option<Metrics>,
}

#[shuttle_runtime::async_trait]
impl shuttle_runtime::Service for FeedService {
    async fn bind(self, addr: SocketAddr) -> Result<(), shuttle_runtime::Error> {
        let mut router = self.services.router();
        if let Some(m) = &self.metrics {
            router = router.merge(m.router());
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))
            .map_err(shuttle_runtime::Error::Custom)?;

        serve(
            listener,
            router,
            self.services.scheduler.clone(),
            std::future::pending(),
        )
        .await
        .map_err(shuttle_runtime::Error::Custom)
    }
}

#[shuttle_runtime::main]
async fn shuttle_main() -> Result<FeedService, shuttle_runtime::Error> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = FeedConfig::load().map_err(shuttle_runtime::Error::Custom)?;
    let services = build_services(&cfg).map_err(shuttle_runtime::Error::Custom)?;

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(target: "app", error = %format!("{e:#}"), "metrics disabled");
            None
        }
    };

    Ok(FeedService { services, metrics })
}

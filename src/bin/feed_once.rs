//! Run a single fetch cycle plus retention against the configured backends,
//! then print the run report as JSON. Optional first argument: device token.

use askarg_feed::{build_services, init_tracing, FeedConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = FeedConfig::load()?;
    let services = build_services(&cfg)?;
    let token = std::env::args().nth(1);

    let report = services.scheduler.trigger(token.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

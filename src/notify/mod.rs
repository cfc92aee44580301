// src/notify/mod.rs
//! Push delivery to single device tokens.

pub mod fcm;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::{FeedConfig, NotifyBackend};

pub use fcm::FcmNotifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
}

impl PushMessage {
    pub fn new(token: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// One attempt, no retries; failures go back to the caller.
    async fn deliver(&self, msg: &PushMessage) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub type DynNotifier = Arc<dyn Notifier>;

/// Logs instead of sending. Used when push is not configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, msg: &PushMessage) -> Result<()> {
        info!(
            target: "notify",
            token = %token_fingerprint(&msg.token),
            title = %msg.title,
            body = %msg.body,
            "push (log only)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Short SHA-256 prefix of a device token, safe to put in logs.
pub fn token_fingerprint(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Build the configured notifier.
pub fn build_notifier(cfg: &FeedConfig) -> Result<DynNotifier> {
    match cfg.notify.backend {
        NotifyBackend::Log => Ok(Arc::new(LogNotifier)),
        NotifyBackend::Fcm => {
            let n = FcmNotifier::with_base_url(
                &cfg.notify.base_url,
                cfg.notify_project_id(),
                cfg.google_access_token.clone(),
                Duration::from_secs(cfg.notify.timeout_secs),
            )
            .context("building fcm notifier")?;
            Ok(Arc::new(n))
        }
    }
}

// src/notify/fcm.rs
//! Firebase Cloud Messaging HTTP v1 sender.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{token_fingerprint, Notifier, PushMessage};

pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";

pub struct FcmNotifier {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
}

impl FcmNotifier {
    pub fn new(project_id: &str, access_token: Option<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_FCM_BASE_URL, project_id, access_token, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        project_id: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err(anyhow!("fcm project id is empty"));
        }
        let client = Client::builder()
            .user_agent("askarg-feed/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("reqwest client")?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1/projects/{}/messages:send",
                base_url.trim_end_matches('/'),
                project_id
            ),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        })
    }
}

#[derive(Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
}

#[derive(Serialize)]
struct FcmSendPayload<'a> {
    message: FcmMessage<'a>,
}

impl<'a> FcmSendPayload<'a> {
    fn from_push(msg: &'a PushMessage) -> Self {
        Self {
            message: FcmMessage {
                token: &msg.token,
                notification: FcmNotification {
                    title: &msg.title,
                    body: &msg.body,
                },
            },
        }
    }
}

#[async_trait]
impl Notifier for FcmNotifier {
    async fn deliver(&self, msg: &PushMessage) -> Result<()> {
        let mut rb = self
            .client
            .post(&self.endpoint)
            .json(&FcmSendPayload::from_push(msg));
        if let Some(t) = &self.access_token {
            rb = rb.bearer_auth(t);
        }

        let rsp = rb
            .send()
            .await
            .map_err(|e| anyhow!("FCM request failed: {e}"))?;
        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "FCM HTTP {status} for token {}: {}",
                token_fingerprint(&msg.token),
                body.trim()
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fcm"
    }
}

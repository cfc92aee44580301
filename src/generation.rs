// src/generation.rs
//! Text generation backend: prompt in, raw model text out.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GenerationCfg;

pub const SYSTEM_PROMPT: &str = "You are Askarg AI Assistant helping students find tech news and jobs. \
Always respond in pure JSON format without explanations or markdown.";

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn TextGenerator>;

/// Perplexity chat-completions client.
pub struct PerplexityClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl PerplexityClient {
    pub fn new(cfg: &GenerationCfg) -> Result<Self> {
        let api_key = cfg
            .resolved_api_key()
            .ok_or_else(|| anyhow!("missing PERPLEXITY_API_KEY"))?
            .to_string();
        let http = reqwest::Client::builder()
            .user_agent(concat!("askarg-feed/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(cfg.timeout())
            .build()
            .context("building generation http client")?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            api_key,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl TextGenerator for PerplexityClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("perplexity request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("perplexity HTTP {status}: {}", truncate(&body, 200));
        }

        let body: Resp = resp.json().await.context("decoding perplexity response")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("perplexity response has no choices"))?;
        Ok(content.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "perplexity"
    }
}

/// Always fails; used when generation is switched off.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("generation is disabled")
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Perplexity when enabled and keyed, otherwise the disabled generator.
pub fn build_generator(cfg: &GenerationCfg) -> Result<DynGenerator> {
    if !cfg.enabled {
        return Ok(Arc::new(DisabledGenerator));
    }
    if cfg.resolved_api_key().is_none() {
        tracing::warn!(target: "generation", "PERPLEXITY_API_KEY not set; generation disabled");
        return Ok(Arc::new(DisabledGenerator));
    }
    Ok(Arc::new(PerplexityClient::new(cfg)?))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

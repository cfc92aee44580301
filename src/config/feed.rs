// src/config/feed.rs
//! Service configuration: TOML file, then environment overrides, then sanitizing.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::notify::fcm::DEFAULT_FCM_BASE_URL;
use crate::store::firestore::DEFAULT_FIRESTORE_BASE_URL;

pub const ENV_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/feed.toml";

const MIN_INTERVAL_SECS: u64 = 60;

fn default_interval_secs() -> u64 {
    3600
}
fn default_retention_days() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_diversity_limit() -> usize {
    5
}
fn default_generation_base_url() -> String {
    "https://api.perplexity.ai".to_string()
}
fn default_model() -> String {
    "sonar-pro".to_string()
}
fn default_temperature() -> f32 {
    0.5
}
fn default_generation_timeout() -> u64 {
    30
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_store_base_url() -> String {
    DEFAULT_FIRESTORE_BASE_URL.to_string()
}
fn default_store_timeout() -> u64 {
    15
}
fn default_fcm_base_url() -> String {
    DEFAULT_FCM_BASE_URL.to_string()
}
fn default_notify_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleCfg {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Also prune chat messages after each scheduled cycle.
    #[serde(default = "default_true")]
    pub sweep_chat: bool,
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retention_days: default_retention_days(),
            sweep_chat: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCfg {
    #[serde(default = "default_diversity_limit")]
    pub diversity_limit: usize,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            diversity_limit: default_diversity_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationCfg {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    /// "ENV" means: read from PERPLEXITY_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

impl Default for GenerationCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_generation_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_generation_timeout(),
            api_key: default_api_key(),
        }
    }
}

impl GenerationCfg {
    /// Resolved key; `None` while it is still the "ENV" placeholder or blank.
    pub fn resolved_api_key(&self) -> Option<&str> {
        let k = self.api_key.trim();
        if k.is_empty() || k.eq_ignore_ascii_case("env") {
            None
        } else {
            Some(k)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Firestore,
}

impl StoreBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "firestore" => Some(Self::Firestore),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreCfg {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_store_base_url")]
    pub base_url: String,
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            project_id: String::new(),
            base_url: default_store_base_url(),
            timeout_secs: default_store_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyBackend {
    #[default]
    Log,
    Fcm,
}

impl NotifyBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Some(Self::Log),
            "fcm" => Some(Self::Fcm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyCfg {
    #[serde(default)]
    pub backend: NotifyBackend,
    /// Falls back to `store.project_id` when unset.
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_fcm_base_url")]
    pub base_url: String,
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifyCfg {
    fn default() -> Self {
        Self {
            backend: NotifyBackend::default(),
            project_id: None,
            base_url: default_fcm_base_url(),
            timeout_secs: default_notify_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub schedule: ScheduleCfg,
    #[serde(default)]
    pub pipeline: PipelineCfg,
    #[serde(default)]
    pub generation: GenerationCfg,
    #[serde(default)]
    pub store: StoreCfg,
    #[serde(default)]
    pub notify: NotifyCfg,
    /// Bearer token for Firestore and FCM. Only ever read from the environment.
    #[serde(skip)]
    pub google_access_token: Option<String>,
}

impl FeedConfig {
    /// Load using env var + fallbacks:
    /// 1) $FEED_CONFIG_PATH (must exist)
    /// 2) config/feed.toml (optional)
    /// then apply env overrides and sanitize.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(PathBuf::from(p))?,
            Err(_) => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(&p)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|k| std::env::var(k).ok());
    }

    /// Overrides from any key lookup; unparsable values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("FEED_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.schedule.interval_secs = v;
        }
        if let Some(v) = get("FEED_RETENTION_DAYS").and_then(|v| v.parse().ok()) {
            self.schedule.retention_days = v;
        }
        if let Some(v) = get("FEED_DIVERSITY_LIMIT").and_then(|v| v.parse().ok()) {
            self.pipeline.diversity_limit = v;
        }
        if let Some(v) = get("FEED_STORE").and_then(|v| StoreBackend::parse(&v)) {
            self.store.backend = v;
        }
        if let Some(v) = get("FEED_NOTIFIER").and_then(|v| NotifyBackend::parse(&v)) {
            self.notify.backend = v;
        }
        if self.generation.resolved_api_key().is_none() {
            if let Some(v) = get("PERPLEXITY_API_KEY") {
                self.generation.api_key = v;
            }
        }
        if let Some(v) = get("PERPLEXITY_BASE_URL") {
            self.generation.base_url = v;
        }
        if let Some(v) = get("FIREBASE_PROJECT_ID") {
            self.store.project_id = v;
        }
        if let Some(v) = get("FIRESTORE_BASE_URL") {
            self.store.base_url = v;
        }
        if let Some(v) = get("GOOGLE_ACCESS_TOKEN") {
            self.google_access_token = Some(v);
        }
    }

    /// Clamp out-of-range values back to something usable.
    pub fn sanitize(&mut self) {
        if self.schedule.interval_secs < MIN_INTERVAL_SECS {
            self.schedule.interval_secs = MIN_INTERVAL_SECS;
        }
        if self.pipeline.diversity_limit == 0 {
            self.pipeline.diversity_limit = 1;
        }
        if self.generation.timeout_secs == 0 {
            self.generation.timeout_secs = 1;
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            self.generation.temperature = default_temperature();
        }
        if self.store.timeout_secs == 0 {
            self.store.timeout_secs = 1;
        }
        if self.notify.timeout_secs == 0 {
            self.notify.timeout_secs = 1;
        }
        for url in [
            &mut self.generation.base_url,
            &mut self.store.base_url,
            &mut self.notify.base_url,
        ] {
            while url.ends_with('/') {
                url.pop();
            }
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }

    /// FCM project, falling back to the store's.
    pub fn notify_project_id(&self) -> &str {
        self.notify
            .project_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&self.store.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = FeedConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.schedule.interval_secs, 3600);
        assert_eq!(cfg.schedule.retention_days, 1);
        assert_eq!(cfg.pipeline.diversity_limit, 5);
        assert_eq!(cfg.generation.model, "sonar-pro");
        assert_eq!(cfg.generation.timeout_secs, 30);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.notify.backend, NotifyBackend::Log);
        assert!(cfg.generation.resolved_api_key().is_none());
        assert_eq!(cfg.store.base_url, DEFAULT_FIRESTORE_BASE_URL);
        assert_eq!(cfg.notify.base_url, DEFAULT_FCM_BASE_URL);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = FeedConfig::from_toml_str(
            r#"
            [schedule]
            interval_secs = 900

            [store]
            backend = "firestore"
            project_id = "askarg"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.schedule.interval_secs, 900);
        assert!(cfg.schedule.sweep_chat);
        assert_eq!(cfg.store.backend, StoreBackend::Firestore);
        assert_eq!(cfg.notify_project_id(), "askarg");
    }

    #[test]
    fn overrides_then_sanitize() {
        let env: HashMap<&str, &str> = [
            ("FEED_INTERVAL_SECS", "5"),
            ("FEED_DIVERSITY_LIMIT", "0"),
            ("FEED_STORE", "Firestore"),
            ("FEED_NOTIFIER", "carrier-pigeon"),
            ("PERPLEXITY_API_KEY", " pplx-123 "),
            ("PERPLEXITY_BASE_URL", "http://localhost:9999/"),
            ("FEED_RETENTION_DAYS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut cfg = FeedConfig::default();
        cfg.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        cfg.sanitize();

        assert_eq!(cfg.schedule.interval_secs, 60);
        assert_eq!(cfg.pipeline.diversity_limit, 1);
        assert_eq!(cfg.store.backend, StoreBackend::Firestore);
        // unknown backend name is ignored
        assert_eq!(cfg.notify.backend, NotifyBackend::Log);
        assert_eq!(cfg.schedule.retention_days, 1);
        assert_eq!(cfg.generation.resolved_api_key(), Some("pplx-123"));
        assert_eq!(cfg.generation.base_url, "http://localhost:9999");
    }

    #[test]
    fn explicit_key_in_file_wins_over_env() {
        let mut cfg = FeedConfig::from_toml_str("[generation]\napi_key = \"from-file\"").unwrap();
        cfg.apply_overrides_from(|k| (k == "PERPLEXITY_API_KEY").then(|| "from-env".to_string()));
        assert_eq!(cfg.generation.resolved_api_key(), Some("from-file"));
    }
}

// src/config/mod.rs
pub mod feed;

pub use feed::{
    FeedConfig, GenerationCfg, NotifyBackend, NotifyCfg, PipelineCfg, ScheduleCfg, StoreBackend,
    StoreCfg, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH,
};

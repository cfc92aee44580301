// src/error.rs
use thiserror::Error;

/// Errors surfaced to callers of the scheduler and the chat fan-out.
///
/// Per-category and per-record failures inside a cycle are not errors; they
/// end up in the cycle report instead.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Another run holds the guard.
    #[error("a run is already in progress")]
    Busy,

    #[error("chat room not found: {0}")]
    RoomNotFound(String),

    /// The spawned run panicked or was aborted before reporting.
    #[error("run aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}


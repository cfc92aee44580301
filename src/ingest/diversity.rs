// src/ingest/diversity.rs
//! At most one listing per source platform.
//!
//! Single greedy pass in encounter order. It does not search for the most
//! diverse subset, and it never backfills: repeats and `Other` links are
//! dropped even when that leaves fewer than `limit` posts.

use std::collections::HashSet;

use crate::ingest::platform::{classify, Platform};
use crate::ingest::types::Post;

pub const DEFAULT_DIVERSITY_LIMIT: usize = 5;

pub fn select(posts: Vec<Post>, limit: usize) -> Vec<Post> {
    let mut seen: HashSet<Platform> = HashSet::new();
    let mut kept = Vec::with_capacity(limit.min(posts.len()));

    for post in posts {
        if kept.len() >= limit {
            break;
        }
        let platform = classify(&post.link);
        if platform == Platform::Other || !seen.insert(platform) {
            continue;
        }
        kept.push(post);
    }
    kept
}

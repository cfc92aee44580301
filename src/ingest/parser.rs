// src/ingest/parser.rs
//! Model output → posts.
//!
//! The model is asked for a strict JSON array of objects, but nothing
//! guarantees it. Anything that is not such an array parses to zero posts;
//! that is a normal outcome, not an error.

use serde_json::{Map, Value};

use crate::ingest::types::Post;

/// Top-level shape of a raw response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Array,
    NotArray,
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub shape: PayloadShape,
    pub posts: Vec<Post>,
    /// Array elements dropped (non-objects or missing title/link).
    pub rejected: usize,
}

/// Parse a raw response into valid posts, keeping input order.
pub fn parse(raw: &str) -> Vec<Post> {
    parse_detailed(raw).posts
}

/// Like [`parse`], also reporting why the output may be empty.
pub fn parse_detailed(raw: &str) -> Parsed {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(_) => {
            return Parsed {
                shape: PayloadShape::Malformed,
                posts: Vec::new(),
                rejected: 0,
            }
        }
    };
    let Value::Array(items) = value else {
        return Parsed {
            shape: PayloadShape::NotArray,
            posts: Vec::new(),
            rejected: 0,
        };
    };

    let total = items.len();
    let posts: Vec<Post> = items
        .iter()
        .filter_map(Value::as_object)
        .map(post_from_object)
        .filter(Post::is_valid)
        .collect();

    Parsed {
        shape: PayloadShape::Array,
        rejected: total - posts.len(),
        posts,
    }
}

/// String field, trimmed; non-string values count as absent.
fn text<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str).map(str::trim)
}

fn post_from_object(obj: &Map<String, Value>) -> Post {
    Post {
        title: text(obj, "title").unwrap_or_default().to_string(),
        description: text(obj, "summary")
            .or_else(|| text(obj, "description"))
            .unwrap_or_default()
            .to_string(),
        link: text(obj, "link").unwrap_or_default().to_string(),
        company: text(obj, "company").unwrap_or_default().to_string(),
        location: text(obj, "location").unwrap_or_default().to_string(),
    }
}

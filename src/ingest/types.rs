// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::prompts;
use crate::store::{FieldValue, Fields, Filter};

pub const NEWS_COLLECTION: &str = "news_articles";
pub const LISTINGS_COLLECTION: &str = "internships_jobs";

/// Placeholder written for listing fields the model left out.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Content kinds processed per cycle, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NewsArticles,
    Jobs,
    Internships,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::NewsArticles, Category::Jobs, Category::Internships];

    pub fn name(self) -> &'static str {
        match self {
            Category::NewsArticles => "news_articles",
            Category::Jobs => "jobs",
            Category::Internships => "internships",
        }
    }

    /// Collection the category's records land in.
    pub fn collection(self) -> &'static str {
        match self {
            Category::NewsArticles => NEWS_COLLECTION,
            Category::Jobs | Category::Internships => LISTINGS_COLLECTION,
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Category::NewsArticles => prompts::NEWS_PROMPT,
            Category::Jobs => prompts::JOBS_PROMPT,
            Category::Internships => prompts::INTERNSHIPS_PROMPT,
        }
    }

    /// Jobs and internships go through platform diversity selection; news does not.
    pub fn uses_diversity(self) -> bool {
        !matches!(self, Category::NewsArticles)
    }

    /// Fixed (title, body) of the push sent when the category gained items.
    pub fn notification(self) -> (&'static str, &'static str) {
        match self {
            Category::NewsArticles => ("New Tech News 🔔", "New articles have been added."),
            Category::Jobs => ("Jobs Updated 💼", "New job posts available."),
            Category::Internships => ("Internships Updated 🎓", "Fresh internships just added."),
        }
    }

    pub fn listing_kind(self) -> Option<ListingKind> {
        match self {
            Category::NewsArticles => None,
            Category::Jobs => Some(ListingKind::Job),
            Category::Internships => Some(ListingKind::Internship),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name.trim())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated item out of the model response. Lives for one cycle only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub description: String,
    pub link: String,
    pub company: String,
    pub location: String,
}

impl Post {
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.link.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingKind {
    Job,
    Internship,
}

impl ListingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingKind::Job => "Job",
            ListingKind::Internship => "Internship",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsRecord {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub kind: ListingKind,
    pub link: String,
    pub timestamp: DateTime<Utc>,
}

/// A persisted document, shaped per collection.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredRecord {
    News(NewsRecord),
    Listing(ListingRecord),
}

fn or_not_specified(s: &str) -> String {
    let t = s.trim();
    if t.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        t.to_string()
    }
}

impl StoredRecord {
    pub fn from_post(category: Category, post: &Post, now: DateTime<Utc>) -> Self {
        match category.listing_kind() {
            None => StoredRecord::News(NewsRecord {
                title: post.title.trim().to_string(),
                summary: post.description.trim().to_string(),
                url: post.link.trim().to_string(),
                timestamp: now,
            }),
            Some(kind) => StoredRecord::Listing(ListingRecord {
                title: post.title.trim().to_string(),
                company: or_not_specified(&post.company),
                location: or_not_specified(&post.location),
                kind,
                link: post.link.trim().to_string(),
                timestamp: now,
            }),
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            StoredRecord::News(_) => NEWS_COLLECTION,
            StoredRecord::Listing(_) => LISTINGS_COLLECTION,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            StoredRecord::News(n) => &n.title,
            StoredRecord::Listing(l) => &l.title,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            StoredRecord::News(n) => n.timestamp,
            StoredRecord::Listing(l) => l.timestamp,
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        match self {
            StoredRecord::News(n) => DedupKey::news(&n.title),
            StoredRecord::Listing(l) => DedupKey::listing(&l.title, &l.link),
        }
    }

    /// Document fields in the layout the mobile client reads.
    pub fn to_fields(&self) -> Fields {
        let mut f = Fields::new();
        match self {
            StoredRecord::News(n) => {
                f.insert("title".into(), FieldValue::from(n.title.as_str()));
                f.insert("summary".into(), FieldValue::from(n.summary.as_str()));
                f.insert("fullContent".into(), FieldValue::from(""));
                f.insert("source".into(), FieldValue::from(""));
                f.insert("url".into(), FieldValue::from(n.url.as_str()));
                f.insert("timestamp".into(), FieldValue::Timestamp(n.timestamp));
            }
            StoredRecord::Listing(l) => {
                f.insert("title".into(), FieldValue::from(l.title.as_str()));
                f.insert("company".into(), FieldValue::from(l.company.as_str()));
                f.insert("location".into(), FieldValue::from(l.location.as_str()));
                f.insert("type".into(), FieldValue::from(l.kind.as_str()));
                f.insert("link".into(), FieldValue::from(l.link.as_str()));
                f.insert("timestamp".into(), FieldValue::Timestamp(l.timestamp));
            }
        }
        f.insert("keywords".into(), FieldValue::Array(Vec::new()));
        f
    }
}

/// Identity used to decide whether a record already exists.
/// News is keyed by title alone, listings by (title, link).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    News { title: String },
    Listing { title: String, link: String },
}

impl DedupKey {
    pub fn news(title: &str) -> Self {
        DedupKey::News {
            title: title.trim().to_string(),
        }
    }

    pub fn listing(title: &str, link: &str) -> Self {
        DedupKey::Listing {
            title: title.trim().to_string(),
            link: link.trim().to_string(),
        }
    }

    pub fn for_post(category: Category, post: &Post) -> Self {
        if category.listing_kind().is_some() {
            Self::listing(&post.title, &post.link)
        } else {
            Self::news(&post.title)
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            DedupKey::News { .. } => NEWS_COLLECTION,
            DedupKey::Listing { .. } => LISTINGS_COLLECTION,
        }
    }

    /// Equality filters matching a stored document with this key.
    pub fn filters(&self) -> Vec<Filter> {
        match self {
            DedupKey::News { title } => vec![Filter::eq("title", title.as_str())],
            DedupKey::Listing { title, link } => vec![
                Filter::eq("title", title.as_str()),
                Filter::eq("link", link.as_str()),
            ],
        }
    }
}

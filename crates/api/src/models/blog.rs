use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use resona_core::BlogPostId;

/// A published article.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Listing entry, without the body.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlogPostSummary {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

use serde::{Deserialize, Serialize};

use resona_core::CategoryId;

/// Slug of the hidden category holding installation/transport packs.
pub const MONTAJE_SLUG: &str = "montaje";

/// A product or pack category.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Hidden categories are never listed publicly.
    pub is_hidden: bool,
    pub sort_order: i32,
}

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{BlogPost, BlogPostSummary, Pagination};

/// Read-only access to published blog posts.
pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    /// Create a new blog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(
        &self,
        pagination: Pagination,
    ) -> Result<Vec<BlogPostSummary>, RepositoryError> {
        Ok(sqlx::query_as::<_, BlogPostSummary>(
            r"
            SELECT id, title, slug, excerpt, author, published_at
            FROM blog_posts
            WHERE published
            ORDER BY published_at DESC NULLS LAST, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?)
    }

    /// A published post by slug. Drafts are not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        Ok(sqlx::query_as::<_, BlogPost>(
            r"
            SELECT id, title, slug, excerpt, content, author, published_at
            FROM blog_posts
            WHERE slug = $1 AND published
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?)
    }
}

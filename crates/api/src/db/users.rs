use sqlx::PgPool;

use resona_core::UserId;

use super::RepositoryError;
use crate::models::User;

/// Repository for user lookups.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(sqlx::query_as::<_, User>(
            r"
            SELECT id, email, first_name, last_name, role, user_level
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?)
    }
}

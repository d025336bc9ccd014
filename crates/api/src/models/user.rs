use serde::{Deserialize, Serialize};

use resona_core::{Email, UserId, UserLevel, UserRole};

/// A customer or staff account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub user_level: UserLevel,
}

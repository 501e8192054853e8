//! Profile row model

use shared::models::{Profile, Role};
use sqlx::FromRow;

use crate::db::repository::{RepoError, RepoResult};

/// Row of the `profiles` table; `password_hash` never leaves the db layer
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: String,
    pub password_hash: String,
    pub created_at: i64,
}

impl ProfileRow {
    pub fn into_model(self) -> RepoResult<Profile> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e| RepoError::Database(format!("Corrupt role value: {e}")))?;
        Ok(Profile {
            id: self.id,
            username: self.username,
            full_name: self.full_name,
            role,
            created_at: self.created_at,
        })
    }
}

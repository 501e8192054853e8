//! Profile Repository

use shared::models::{Profile, Role};
use shared::util::now_millis;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};
use crate::db::models::ProfileRow;

const COLUMNS: &str = "id, username, full_name, role, password_hash, created_at";

/// New profile payload (hash already computed by the caller)
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub password_hash: String,
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Profile>> {
    let row = fetch_row(pool, "id", id).await?;
    row.map(ProfileRow::into_model).transpose()
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<Profile>> {
    let row = fetch_row(pool, "username", username).await?;
    row.map(ProfileRow::into_model).transpose()
}

/// Fetch the raw row including the password hash, for credential checks
pub async fn find_row_by_username(
    pool: &SqlitePool,
    username: &str,
) -> RepoResult<Option<ProfileRow>> {
    fetch_row(pool, "username", username).await
}

async fn fetch_row(
    pool: &SqlitePool,
    column: &'static str,
    value: &str,
) -> RepoResult<Option<ProfileRow>> {
    let row = sqlx::query_as::<_, ProfileRow>(&format!(
        "SELECT {COLUMNS} FROM profiles WHERE {column} = ? LIMIT 1"
    ))
    .bind(value)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: NewProfile) -> RepoResult<Profile> {
    if find_by_username(pool, &data.username).await?.is_some() {
        return Err(RepoError::Conflict(format!(
            "Username {} is already taken",
            data.username
        )));
    }

    let created_at = now_millis();
    sqlx::query(
        "INSERT INTO profiles (id, username, full_name, role, password_hash, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&data.id)
    .bind(&data.username)
    .bind(&data.full_name)
    .bind(data.role.as_str())
    .bind(&data.password_hash)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(Profile {
        id: data.id,
        username: data.username,
        full_name: data.full_name,
        role: data.role,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn create_and_find_profile() {
        let db = DbService::open_in_memory().await.unwrap();
        let profile = create(
            &db.pool,
            NewProfile {
                id: "p-1".into(),
                username: "ada".into(),
                full_name: Some("Ada L".into()),
                role: Role::Customer,
                password_hash: "$argon2$fake".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(profile.role, Role::Customer);
        let found = find_by_username(&db.pool, "ada").await.unwrap().unwrap();
        assert_eq!(found.id, "p-1");
        assert!(find_by_username(&db.pool, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let db = DbService::open_in_memory().await.unwrap();
        let data = NewProfile {
            id: "p-1".into(),
            username: "ada".into(),
            full_name: None,
            role: Role::Customer,
            password_hash: "$argon2$fake".into(),
        };
        create(&db.pool, data.clone()).await.unwrap();

        let dup = NewProfile {
            id: "p-2".into(),
            ..data
        };
        assert!(matches!(
            create(&db.pool, dup).await,
            Err(RepoError::Conflict(_))
        ));
    }
}

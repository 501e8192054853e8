//! Product Repository

use shared::models::Product;
use shared::util::now_millis;
use sqlx::SqlitePool;

use super::RepoResult;
use crate::db::models::ProductRow;

const COLUMNS: &str = "id, name, description, price, image_url, category, available, created_at";

/// Find all available products, newest first
pub async fn find_available(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {COLUMNS} FROM products WHERE available = 1 ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ProductRow::into_model).collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {COLUMNS} FROM products WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(ProductRow::into_model).transpose()
}

/// Insert a product (catalog administration / seeding)
pub async fn create(pool: &SqlitePool, product: &Product) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO products (id, name, description, price, image_url, category, available, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price.to_string())
    .bind(&product.image_url)
    .bind(&product.category)
    .bind(product.available)
    .bind(if product.created_at > 0 {
        product.created_at
    } else {
        now_millis()
    })
    .execute(pool)
    .await?;
    Ok(())
}

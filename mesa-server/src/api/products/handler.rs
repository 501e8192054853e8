//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::Product;

use crate::core::AppState;
use crate::db::repository::product;
use crate::utils::{AppError, AppResult};

/// GET /api/products - available products
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let products = product::find_available(&state.db).await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let product = product::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;
    Ok(Json(product))
}

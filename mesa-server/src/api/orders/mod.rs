//! Order API module

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/orders", routes())
        .route("/api/admin/orders", get(handler::list_all))
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", patch(handler::update_status))
}

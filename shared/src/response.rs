//! Response payloads

use crate::models::{Order, OrderDetail, Profile};
use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint
///
/// `error` is a stable machine-readable code (e.g. `validation_error`,
/// `compensation_failed`), `message` is human-readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// `{order}` envelope returned by checkout and status updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order: Order,
}

/// `{orders}` envelope returned by listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderDetail>,
}

/// `{order}` envelope for a single joined order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetailResponse {
    pub order: OrderDetail,
}

/// Returned by `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub profile: Profile,
}

/// Returned by `GET /api/auth/me` and `POST /api/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}

/// Returned by `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

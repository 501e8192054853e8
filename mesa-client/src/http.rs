//! HTTP client for the Mesa server API

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::models::{Order, OrderDetail, OrderStatus, Product, Profile};
use shared::request::{
    CreateOrderRequest, LoginRequest, OrderItemInput, RegisterRequest, UpdateOrderStatusRequest,
};
use shared::response::{
    ErrorBody, LoginResponse, OrderDetailResponse, OrderResponse, OrdersResponse, ProfileResponse,
};

use crate::cart::CartStore;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// HTTP client for network calls to the Mesa server
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        }
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Drop the stored token (sign out)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let mut request = self.client.get(self.url(path));
        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        Self::handle_response(request.send().await?).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        Self::handle_response(request.send().await?).await
    }

    async fn patch<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let mut request = self.client.patch(self.url(path)).json(body);
        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        Self::handle_response(request.send().await?).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(message)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(message)),
                StatusCode::CONFLICT => Err(ClientError::Conflict(message)),
                _ => Err(ClientError::Server(message)),
            };
        }

        response.json().await.map_err(Into::into)
    }

    // ========== Auth API ==========

    /// Login; the returned token is also stored on this client
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post("api/auth/login", &request).await?;
        self.set_token(response.token.clone());
        Ok(response)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> ClientResult<Profile> {
        let request = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            full_name: full_name.map(|n| n.to_string()),
        };
        let response: ProfileResponse = self.post("api/auth/register", &request).await?;
        Ok(response.profile)
    }

    pub async fn me(&self) -> ClientResult<Profile> {
        let response: ProfileResponse = self.get("api/auth/me").await?;
        Ok(response.profile)
    }

    // ========== Catalog API ==========

    pub async fn products(&self) -> ClientResult<Vec<Product>> {
        self.get("api/products").await
    }

    pub async fn product(&self, id: &str) -> ClientResult<Product> {
        self.get(&format!("api/products/{id}")).await
    }

    // ========== Order API ==========

    pub async fn create_order(&self, request: &CreateOrderRequest) -> ClientResult<Order> {
        let response: OrderResponse = self.post("api/orders", request).await?;
        Ok(response.order)
    }

    /// Submit the cart as an order and clear it on success
    ///
    /// The order total is the cart subtotal: an order's total always equals
    /// the sum of its lines' unit_price * quantity; tax is a display-level
    /// derivation.
    pub async fn checkout(
        &self,
        cart: &CartStore,
        notes: Option<String>,
    ) -> ClientResult<Order> {
        let items = cart
            .lines()
            .into_iter()
            .map(|line| OrderItemInput {
                product_id: line.product_id,
                quantity: line.quantity as i64,
                unit_price: line.price,
            })
            .collect();
        let request = CreateOrderRequest {
            items,
            total: cart.subtotal(),
            notes,
        };

        let order = self.create_order(&request).await?;

        // Only a confirmed order empties the cart
        cart.clear()?;
        cart.flush()?;
        Ok(order)
    }

    /// Own orders, newest first
    pub async fn my_orders(&self) -> ClientResult<Vec<OrderDetail>> {
        let response: OrdersResponse = self.get("api/orders").await?;
        Ok(response.orders)
    }

    pub async fn order(&self, id: &str) -> ClientResult<OrderDetail> {
        let response: OrderDetailResponse = self.get(&format!("api/orders/{id}")).await?;
        Ok(response.order)
    }

    /// Every order; requires the operator role
    pub async fn all_orders(&self) -> ClientResult<Vec<OrderDetail>> {
        let response: OrdersResponse = self.get("api/admin/orders").await?;
        Ok(response.orders)
    }

    /// Advance an order's status; requires the operator role
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<Order> {
        let request = UpdateOrderStatusRequest { status };
        let response: OrderResponse = self
            .patch(&format!("api/orders/{order_id}/status"), &request)
            .await?;
        Ok(response.order)
    }
}

use std::sync::Arc;

use serde_json::Value;

use crate::api::error::{ClientError, Result};
use crate::api::request::encode_segment;
use crate::api::{ApiClient, ApiRequest};
use crate::config::FeaturesConfig;
use crate::models::{CheckoutRequest, Order};

/// The signed-in user's order history.
pub struct OrderApi {
    client: Arc<ApiClient>,
}

impl OrderApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        OrderApi { client }
    }

    pub async fn orders(&self) -> Result<Vec<Order>> {
        self.client.get("/orders").await
    }

    pub async fn order_by_id(&self, id: &str) -> Result<Order> {
        self.client
            .get(&format!("/orders/{}", encode_segment(id)))
            .await
    }

    /// The backend may answer with or without the updated order.
    pub async fn cancel_order(&self, id: &str) -> Result<()> {
        self.client
            .call_optional::<Value>(ApiRequest::post(format!(
                "/orders/{}/cancel",
                encode_segment(id)
            )))
            .await
            .map(|_| ())
    }
}

pub struct CheckoutApi {
    client: Arc<ApiClient>,
    checkout_enabled: bool,
}

impl CheckoutApi {
    pub fn new(client: Arc<ApiClient>, features: &FeaturesConfig) -> Self {
        CheckoutApi {
            client,
            checkout_enabled: features.enable_checkout,
        }
    }

    pub async fn create_order(&self, request: &CheckoutRequest) -> Result<Order> {
        if !self.checkout_enabled {
            return Err(ClientError::FeatureDisabled("Checkout"));
        }
        self.client.post("/orders", request).await
    }

    pub async fn order(&self, id: &str) -> Result<Order> {
        self.client
            .get(&format!("/orders/{}", encode_segment(id)))
            .await
    }
}

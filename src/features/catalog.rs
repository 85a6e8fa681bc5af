use std::sync::Arc;

use crate::api::error::{ClientError, Result};
use crate::api::request::encode_segment;
use crate::api::{ApiClient, ApiRequest};
use crate::config::FeaturesConfig;
use crate::models::{Category, Product, ProductQuery};

/// Product and category browsing. Anonymous, but runs through the same
/// pipeline so a signed-in visitor's credential is attached.
pub struct CatalogApi {
    client: Arc<ApiClient>,
    search_enabled: bool,
}

impl CatalogApi {
    pub fn new(client: Arc<ApiClient>, features: &FeaturesConfig) -> Self {
        CatalogApi {
            client,
            search_enabled: features.enable_search,
        }
    }

    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.client
            .call(ApiRequest::get("/products").with_query(query.to_pairs()))
            .await
    }

    pub async fn product_by_slug(&self, slug: &str) -> Result<Product> {
        self.client
            .get(&format!("/products/{}", encode_segment(slug)))
            .await
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.client.get("/categories").await
    }

    pub async fn category_by_slug(&self, slug: &str) -> Result<Category> {
        self.client
            .get(&format!("/categories/{}", encode_segment(slug)))
            .await
    }

    pub async fn search_products(&self, q: &str) -> Result<Vec<Product>> {
        if !self.search_enabled {
            return Err(ClientError::FeatureDisabled("Search"));
        }
        self.client
            .call(ApiRequest::get("/products/search").with_query(vec![("q".to_string(), q.to_string())]))
            .await
    }
}

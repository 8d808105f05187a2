//! # Recommendation Provider
//!
//! The boundary to the remote recommendation API. The crate never speaks HTTP
//! itself: callers implement [`RecommendationProvider`] over whatever client they
//! already use, and the fetch effect drives it.
//!
//! ## Example
//!
//! ```rust
//! use storefront_recommendations::provider::{
//!     RecommendationProvider, RecommendationRequest, RecommendationResponse,
//! };
//!
//! #[derive(Clone)]
//! struct StaticProvider;
//!
//! impl RecommendationProvider for StaticProvider {
//!     type Item = String;
//!     type Error = String;
//!
//!     async fn fetch_recommendations(
//!         &self,
//!         _tenant: &str,
//!         _environment: &str,
//!         request: &RecommendationRequest,
//!     ) -> Result<RecommendationResponse<String>, String> {
//!         let products = (0..request.page_size).map(|i| format!("item-{i}")).collect();
//!         Ok(RecommendationResponse::new(request.name.clone(), products))
//!     }
//! }
//! ```

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
    config::{Filter, ProductId, RecommendationConfig},
    types::ItemBounds,
};

/// Parameters sent to the recommendation API for one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub name: String,
    pub fields: Vec<String>,
    pub collection: String,
    pub page_size: usize,
    #[serde(rename = "productID", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl RecommendationRequest {
    /// Build the request for a config. `page_size` is always the API batch size,
    /// never the UI page size.
    pub fn from_config(config: &RecommendationConfig) -> Self {
        Self {
            name: config.name.clone(),
            fields: config.fields.clone(),
            collection: config.collection.clone(),
            page_size: config.max_api_results(),
            product_id: config.product_id.clone(),
            visitor_id: config.visitor_id.clone(),
            login_id: config.login_id.clone(),
            filters: config.filters.clone(),
            event_type: config.event_type.clone(),
        }
    }
}

/// Metadata the API returns alongside a batch
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub model_name: String,
    pub total_count: usize,
}

/// One fetched batch
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationResponse<T> {
    pub products: Vec<T>,
    pub metadata: ResponseMetadata,
    pub raw_response: Option<serde_json::Value>,
}

impl<T> RecommendationResponse<T> {
    /// Response with metadata derived from the products themselves
    pub fn new(model_name: impl Into<String>, products: Vec<T>) -> Self {
        let total_count = products.len();
        Self {
            products,
            metadata: ResponseMetadata {
                model_name: model_name.into(),
                total_count,
            },
            raw_response: None,
        }
    }

    pub fn with_raw_response(mut self, raw: serde_json::Value) -> Self {
        self.raw_response = Some(raw);
        self
    }
}

/// The remote recommendation API as seen by this crate
///
/// Implementations should return `Err` for transport failures and non-success
/// responses alike; the error's `Display` text becomes the instance's `error`.
pub trait RecommendationProvider: Send + Sync + 'static {
    /// The item type returned by the API
    type Item: ItemBounds;
    /// The error type returned on failure
    type Error: std::fmt::Display;

    /// Fetch one batch of recommendations
    fn fetch_recommendations(
        &self,
        tenant: &str,
        environment: &str,
        request: &RecommendationRequest,
    ) -> impl Future<Output = Result<RecommendationResponse<Self::Item>, Self::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_api_batch_size() {
        let config = RecommendationConfig::new("acme", "bought-together", "all")
            .with_ui_page_size(4)
            .with_max_api_results(48)
            .with_product_id("sku-9");
        let request = RecommendationRequest::from_config(&config);
        assert_eq!(request.page_size, 48);
        assert_eq!(request.product_id, Some(ProductId::Single("sku-9".into())));
    }

    #[test]
    fn test_request_serializes_api_field_names() {
        let config = RecommendationConfig::new("acme", "similar", "shoes")
            .with_product_id("sku-1")
            .with_visitor_id("v-1");
        let json = serde_json::to_value(RecommendationRequest::from_config(&config)).unwrap();
        assert_eq!(json["productID"], "sku-1");
        assert_eq!(json["visitorId"], "v-1");
        assert_eq!(json["pageSize"], 100);
        assert!(json.get("loginId").is_none());
        assert!(json.get("filters").is_none());
    }

    #[test]
    fn test_response_metadata_counts_products() {
        let response = RecommendationResponse::new("similar", vec![1, 2, 3]);
        assert_eq!(response.metadata.total_count, 3);
        assert_eq!(response.metadata.model_name, "similar");
        assert!(response.raw_response.is_none());
    }
}

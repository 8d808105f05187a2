#![allow(dead_code)]

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU32, Ordering},
};

use storefront_recommendations::prelude::*;
use storefront_recommendations::provider::{RecommendationRequest, RecommendationResponse};
use tokio::sync::Notify;

/// Fake catalog API: returns `batch_size` items named `{product}-{index}`.
#[derive(Clone)]
pub struct CatalogProvider {
    calls: Arc<AtomicU32>,
    batch_size: usize,
    failure: Arc<Mutex<Option<String>>>,
    gate: Option<(String, Arc<Notify>)>,
}

impl CatalogProvider {
    pub fn new(batch_size: usize) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            batch_size,
            failure: Arc::new(Mutex::new(None)),
            gate: None,
        }
    }

    /// Requests for `product` wait until `gate` is notified
    pub fn gated(mut self, product: &str, gate: Arc<Notify>) -> Self {
        self.gate = Some((product.to_string(), gate));
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl RecommendationProvider for CatalogProvider {
    type Item = String;
    type Error = String;

    async fn fetch_recommendations(
        &self,
        _tenant: &str,
        _environment: &str,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse<String>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let product = request
            .product_id
            .as_ref()
            .map(|id| id.as_slice().join("+"))
            .unwrap_or_else(|| "none".to_string());

        if let Some((gated, notify)) = &self.gate {
            if *gated == product {
                notify.notified().await;
            }
        }

        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(message) = failure {
            return Err(message);
        }

        let count = self.batch_size.min(request.page_size);
        let products = (0..count).map(|i| format!("{product}-{i}")).collect();
        Ok(RecommendationResponse::new(request.name.clone(), products))
    }
}

pub fn config(product: &str, ui_page_size: usize) -> RecommendationConfig {
    RecommendationConfig::new("acme", "similar-items", "all")
        .with_product_id(product)
        .with_ui_page_size(ui_page_size)
}

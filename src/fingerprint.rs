//! Request fingerprints used as cache keys.
//!
//! Only the config fields that change the API request take part: tenant,
//! environment, model, collection, product id(s), visitor id, login id, filters,
//! fields, event type and the API batch size. UI page size and TTL do not.
//! Filters are order-insensitive; product ids and fields keep their order.
//! Defaulted fields hash by their effective value, so leaving `environment` unset
//! and setting it to `"production"` give the same key.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use crate::config::{Filter, ProductId, RecommendationConfig};

#[derive(Hash)]
struct RequestKey<'a> {
    tenant: &'a str,
    environment: &'a str,
    name: &'a str,
    collection: &'a str,
    product_id: Option<&'a [String]>,
    visitor_id: Option<&'a str>,
    login_id: Option<&'a str>,
    filters: Vec<&'a Filter>,
    fields: &'a [String],
    event_type: Option<&'a str>,
    batch_size: usize,
}

/// Deterministic cache key for the request a config produces.
///
/// The readable prefix keeps log lines and cache dumps legible; the hash covers
/// every request-affecting field.
pub fn fingerprint(config: &RecommendationConfig) -> String {
    let mut filters: Vec<&Filter> = config.filters.iter().collect();
    filters.sort();

    let key = RequestKey {
        tenant: &config.shop_tenant,
        environment: config.environment(),
        name: &config.name,
        collection: &config.collection,
        product_id: config.product_id.as_ref().map(ProductId::as_slice),
        visitor_id: config.visitor_id.as_deref(),
        login_id: config.login_id.as_deref(),
        filters,
        fields: &config.fields,
        event_type: config.event_type.as_deref(),
        batch_size: config.max_api_results(),
    };

    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    format!(
        "{}:{}:{}:{:016x}",
        config.shop_tenant,
        config.name,
        config.collection,
        hasher.finish()
    )
}

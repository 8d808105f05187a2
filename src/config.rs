//! # Recommendation Configuration
//!
//! A [`RecommendationConfig`] names a tenant, a recommendation model and a target
//! collection, plus the knobs that shape the result set and how it is paged on
//! the client.
//!
//! Configs can be built in code:
//!
//! ```rust
//! use storefront_recommendations::config::RecommendationConfig;
//! use std::time::Duration;
//!
//! let config = RecommendationConfig::new("acme", "similar-items", "all")
//!     .with_product_id("sku-42")
//!     .with_ui_page_size(4)
//!     .with_cache_ttl(Duration::from_secs(60));
//! assert!(config.validate().is_ok());
//! ```
//!
//! or deserialized from storefront settings, where `cache_ttl` is a humantime
//! string such as `"5m"` or `"30s"`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    errors::ConfigError,
    platform::{
        DEFAULT_CACHE_TTL, DEFAULT_ENVIRONMENT, DEFAULT_MAX_API_RESULTS, DEFAULT_UI_PAGE_SIZE,
    },
};

/// A field filter forwarded to the recommendation API
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: String,
    #[serde(default)]
    pub exclude: bool,
    #[serde(default)]
    pub required: bool,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            exclude: false,
            required: false,
        }
    }

    /// Exclude items matching this filter instead of including them
    pub fn excluded(mut self) -> Self {
        self.exclude = true;
        self
    }

    /// Items must match this filter
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Product context for "similar items" style models
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Single(String),
    Many(Vec<String>),
}

impl ProductId {
    pub fn as_slice(&self) -> &[String] {
        match self {
            ProductId::Single(id) => std::slice::from_ref(id),
            ProductId::Many(ids) => ids,
        }
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        ProductId::Single(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        ProductId::Single(id)
    }
}

impl From<Vec<String>> for ProductId {
    fn from(ids: Vec<String>) -> Self {
        ProductId::Many(ids)
    }
}

/// Configuration for one recommendation instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationConfig {
    pub shop_tenant: String,
    #[serde(default)]
    pub environment: Option<String>,
    pub name: String,
    pub collection: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub ui_page_size: Option<usize>,
    #[serde(default)]
    pub max_api_results: Option<usize>,
    #[serde(default, with = "humantime_opt")]
    pub cache_ttl: Option<Duration>,
    #[serde(default, rename = "productID")]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub visitor_id: Option<String>,
    #[serde(default)]
    pub login_id: Option<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub event_type: Option<String>,
}

impl RecommendationConfig {
    /// Create a config with the three required fields and defaults elsewhere
    pub fn new(
        shop_tenant: impl Into<String>,
        name: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            shop_tenant: shop_tenant.into(),
            environment: None,
            name: name.into(),
            collection: collection.into(),
            fields: Vec::new(),
            ui_page_size: None,
            max_api_results: None,
            cache_ttl: None,
            product_id: None,
            visitor_id: None,
            login_id: None,
            filters: Vec::new(),
            event_type: None,
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ui_page_size(mut self, size: usize) -> Self {
        self.ui_page_size = Some(size);
        self
    }

    pub fn with_max_api_results(mut self, max: usize) -> Self {
        self.max_api_results = Some(max);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_product_id(mut self, product_id: impl Into<ProductId>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn with_visitor_id(mut self, visitor_id: impl Into<String>) -> Self {
        self.visitor_id = Some(visitor_id.into());
        self
    }

    pub fn with_login_id(mut self, login_id: impl Into<String>) -> Self {
        self.login_id = Some(login_id.into());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Check the invariants required before an instance may use this config.
    ///
    /// `cache_ttl` needs no check: a `Duration` cannot be negative, and zero is
    /// accepted (nothing is ever served from cache).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shop_tenant.trim().is_empty() {
            return Err(ConfigError::MissingField("shopTenant"));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField("name"));
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::MissingField("collection"));
        }
        if self.ui_page_size == Some(0) {
            return Err(ConfigError::InvalidPageSize);
        }
        if self.max_api_results == Some(0) {
            return Err(ConfigError::InvalidMaxResults);
        }
        Ok(())
    }

    pub fn environment(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }

    pub fn ui_page_size(&self) -> usize {
        self.ui_page_size.unwrap_or(DEFAULT_UI_PAGE_SIZE)
    }

    pub fn max_api_results(&self) -> usize {
        self.max_api_results.unwrap_or(DEFAULT_MAX_API_RESULTS)
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL)
    }
}

/// Serde adapter for `Option<Duration>` written as humantime strings ("5m", "250ms").
mod humantime_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => {
                serializer.serialize_str(&humantime::format_duration(*duration).to_string())
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|text| humantime::parse_duration(&text).map_err(D::Error::custom))
            .transpose()
    }
}

//! Error types for storefront-recommendations
//!
//! Validation errors ([`ConfigError`], [`InstanceError`], [`InvalidPageSize`]) are
//! returned synchronously at the call site. [`FetchError`] is returned from the
//! async fetch path and is also mirrored into the instance state so subscribers
//! see it without awaiting anything.

/// Invalid or missing recommendation configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required config field: {0}")]
    MissingField(&'static str),
    #[error("UI page size must be greater than zero")]
    InvalidPageSize,
    #[error("Max API results must be greater than zero")]
    InvalidMaxResults,
}

/// Operation on an instance id that was never initialized (or was destroyed)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceError {
    #[error("Recommendation instance '{0}' not initialized. Call init() first.")]
    NotFound(String),
}

/// The recommendation provider rejected the request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch recommendations for {cache_key}: {message}")]
    Provider { cache_key: String, message: String },
}

impl FetchError {
    /// Message mirrored into the instance's `error` field.
    pub fn message(&self) -> &str {
        match self {
            FetchError::Provider { message, .. } => message,
        }
    }
}

/// Requested page size was not strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid page size {0}: must be greater than zero")]
pub struct InvalidPageSize(pub i64);

/// Umbrella error for callers that don't care which stage failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecommendationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Instance(#[from] InstanceError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    PageSize(#[from] InvalidPageSize),
}

/// Result alias for crate operations
pub type RecommendationResult<T> = Result<T, RecommendationError>;

#![doc = include_str!("../README.md")]

// Core modules
pub mod cache;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod fingerprint;
pub mod hooks;
mod log_utils;
pub mod manager;
pub mod pagination;
pub mod platform;
pub mod provider;
pub mod registry;
pub mod runtime;
pub mod state;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root for convenience
pub use config::RecommendationConfig;
pub use manager::{ManagerConfig, RecommendationManager};

pub mod prelude {
    //! The prelude exports the types and functions most widgets need.

    // The manager and its configuration
    pub use crate::manager::{ManagerConfig, PageInfo, RecommendationManager};
    pub use crate::platform::DEFAULT_INSTANCE_ID;

    // Request configuration
    pub use crate::config::{Filter, ProductId, RecommendationConfig};

    // The external API seam
    pub use crate::provider::RecommendationProvider;

    // Instance state, needed for matching and rendering
    pub use crate::pagination::PaginationInfo;
    pub use crate::state::{AsyncState, FetchStatus, RecommendationState};
    pub use crate::store::Subscription;

    // Dioxus hooks
    pub use crate::hooks::{use_current_page_products, use_recommendations};

    // Error types
    pub use crate::errors::{
        ConfigError, FetchError, InstanceError, InvalidPageSize, RecommendationError,
        RecommendationResult,
    };
}

//! Platform-specific time source and crate-wide defaults.

use std::time::Duration;

#[cfg(not(target_family = "wasm"))]
pub use std::time::{Instant, SystemTime};
#[cfg(target_family = "wasm")]
pub use web_time::{Instant, SystemTime};

/// Instance id used when the caller does not name one.
pub const DEFAULT_INSTANCE_ID: &str = "default";

/// Environment passed to the recommendation API when the config leaves it out.
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Items shown per page when the config leaves `ui_page_size` unset.
pub const DEFAULT_UI_PAGE_SIZE: usize = 10;

/// Items requested from the API in one call when `max_api_results` is unset.
pub const DEFAULT_MAX_API_RESULTS: usize = 100;

/// How long a fetched batch is served from cache when `cache_ttl` is unset.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on cached responses shared by all instances.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 20;

/// Interval of the background expired-entry sweep.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

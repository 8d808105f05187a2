//! # Recommendation Manager
//!
//! The public entry point. A manager owns one shared cache, one instance registry
//! and the fetch effect, and exposes every instance-scoped operation: init, fetch,
//! page navigation, page queries, refresh and destroy.
//!
//! Each instance paginates its own over-fetched batch on the client. Navigation
//! never refetches; it only moves `current_page` and re-derives the page window.
//!
//! ## Example
//!
//! ```rust,no_run
//! use storefront_recommendations::prelude::*;
//! # use storefront_recommendations::provider::{RecommendationRequest, RecommendationResponse};
//! # #[derive(Clone)]
//! # struct Api;
//! # impl RecommendationProvider for Api {
//! #     type Item = String;
//! #     type Error = String;
//! #     async fn fetch_recommendations(&self, _: &str, _: &str, r: &RecommendationRequest)
//! #         -> Result<RecommendationResponse<String>, String> {
//! #         Ok(RecommendationResponse::new(r.name.clone(), vec![]))
//! #     }
//! # }
//!
//! # async fn run() -> Result<(), RecommendationError> {
//! let manager = RecommendationManager::new(Api);
//! let config = RecommendationConfig::new("acme", "similar-items", "all")
//!     .with_product_id("sku-42")
//!     .with_ui_page_size(4);
//!
//! manager.init(config, "pdp-similar")?;
//! manager.fetch_recommendations("pdp-similar").await?;
//! manager.next_page("pdp-similar")?;
//! let visible = manager.get_current_page_products("pdp-similar")?;
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::watch;

use crate::{
    cache::{CacheStats, RecommendationCache},
    config::RecommendationConfig,
    errors::{ConfigError, FetchError, InstanceError, InvalidPageSize, RecommendationResult},
    fetch::{FetchEffect, FetchHooks},
    pagination::reposition_for_page_size,
    platform::{DEFAULT_CLEANUP_INTERVAL, DEFAULT_INSTANCE_ID, DEFAULT_MAX_CACHE_SIZE, SystemTime},
    provider::{RecommendationProvider, RecommendationResponse},
    registry::{InstanceHandle, InstanceRegistry},
    runtime::JanitorHandle,
    state::{FetchStatus, RecommendationState},
    store::{Store, Subscription},
};

/// Configuration for a [`RecommendationManager`]
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    max_cache_entries: usize,
    cleanup_interval: Option<Duration>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagerConfig {
    /// Create a new manager configuration with default settings
    pub fn new() -> Self {
        Self {
            max_cache_entries: DEFAULT_MAX_CACHE_SIZE,
            cleanup_interval: None,
        }
    }

    /// Bound the shared cache to `max` batches
    pub fn with_max_cache_entries(mut self, max: usize) -> Self {
        self.max_cache_entries = max;
        self
    }

    /// Sweep expired cache entries in the background every `interval`.
    ///
    /// Only takes effect on native targets when a tokio runtime is running.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Background sweep at the default interval
    pub fn with_background_cleanup(self) -> Self {
        self.with_cleanup_interval(DEFAULT_CLEANUP_INTERVAL)
    }

    /// Build a manager around `provider` with this configuration
    pub fn build<P: RecommendationProvider>(self, provider: P) -> RecommendationManager<P> {
        RecommendationManager::with_config(provider, self)
    }
}

/// Page window summary for UI controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_products: usize,
    pub page_size: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub is_first_page: bool,
    pub is_last_page: bool,
    pub page_start_index: usize,
    pub page_end_index: usize,
    pub products_on_current_page: usize,
}

impl<T> From<&RecommendationState<T>> for PageInfo {
    fn from(state: &RecommendationState<T>) -> Self {
        Self {
            current_page: state.current_page,
            total_pages: state.total_pages,
            total_products: state.total_products,
            page_size: state.ui_page_size,
            has_next_page: state.has_next_page,
            has_previous_page: state.has_previous_page,
            is_first_page: state.is_first_page,
            is_last_page: state.is_last_page,
            page_start_index: state.page_start_index,
            page_end_index: state.page_end_index,
            products_on_current_page: state.page_end_index - state.page_start_index,
        }
    }
}

/// Handle to the recommendation system; clones share cache, registry and provider
pub struct RecommendationManager<P: RecommendationProvider> {
    effect: FetchEffect<P>,
    registry: InstanceRegistry<P::Item>,
    janitor: Option<Arc<JanitorHandle>>,
}

impl<P: RecommendationProvider> Clone for RecommendationManager<P> {
    fn clone(&self) -> Self {
        Self {
            effect: self.effect.clone(),
            registry: self.registry.clone(),
            janitor: self.janitor.clone(),
        }
    }
}

impl<P: RecommendationProvider> PartialEq for RecommendationManager<P> {
    fn eq(&self, other: &Self) -> bool {
        self.registry.ptr_eq(&other.registry)
    }
}

impl<P: RecommendationProvider> RecommendationManager<P> {
    /// Manager with default settings
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ManagerConfig::default())
    }

    pub fn with_config(provider: P, config: ManagerConfig) -> Self {
        let cache = RecommendationCache::with_max_entries(config.max_cache_entries);
        let janitor = config
            .cleanup_interval
            .and_then(|interval| crate::runtime::spawn_cache_janitor(cache.clone(), interval))
            .map(Arc::new);

        Self {
            effect: FetchEffect::new(provider, cache),
            registry: InstanceRegistry::new(),
            janitor,
        }
    }

    /// The shared cache
    pub fn cache(&self) -> &RecommendationCache {
        self.effect.cache()
    }

    /// The instance registry
    pub fn registry(&self) -> &InstanceRegistry<P::Item> {
        &self.registry
    }

    pub fn has_janitor(&self) -> bool {
        self.janitor.is_some()
    }

    /// Validate `config` and register it under `instance_id`.
    ///
    /// Re-initializing an existing id replaces its config. If the request
    /// fingerprint changes, the instance state starts over empty and any fetch
    /// still in flight for the old config is discarded when it lands.
    pub fn init(
        &self,
        config: RecommendationConfig,
        instance_id: &str,
    ) -> Result<String, ConfigError> {
        config.validate()?;
        let _registration = self.registry.register(instance_id, config);
        crate::debug_log!("🔧 [INIT] Instance '{}' {:?}", instance_id, _registration);
        Ok(instance_id.to_string())
    }

    /// [`init`](Self::init) under [`DEFAULT_INSTANCE_ID`]
    pub fn init_default(&self, config: RecommendationConfig) -> Result<String, ConfigError> {
        self.init(config, DEFAULT_INSTANCE_ID)
    }

    /// [`init`](Self::init) followed by [`fetch_recommendations`](Self::fetch_recommendations)
    pub async fn init_and_fetch(
        &self,
        config: RecommendationConfig,
        instance_id: &str,
    ) -> RecommendationResult<Vec<P::Item>> {
        self.init(config, instance_id)?;
        self.fetch_recommendations(instance_id).await
    }

    /// Fetch the batch for an instance and apply it to the instance state.
    ///
    /// Failures are returned and mirrored into the instance's `error` field.
    pub async fn fetch_recommendations(
        &self,
        instance_id: &str,
    ) -> RecommendationResult<Vec<P::Item>> {
        let handle = self.registry.get(instance_id)?;
        let hooks = InstanceHooks {
            registry: &self.registry,
            handle: &handle,
        };

        let response = self.effect.run(&handle.config, &hooks).await?;
        Ok(response.products)
    }

    /// Drop this instance's cache entry and fetch again
    pub async fn refresh_recommendations(
        &self,
        instance_id: &str,
    ) -> RecommendationResult<Vec<P::Item>> {
        let handle = self.registry.get(instance_id)?;
        self.cache().invalidate(&handle.cache_key);
        self.fetch_recommendations(instance_id).await
    }

    /// Items on the instance's current page
    pub fn get_current_page_products(
        &self,
        instance_id: &str,
    ) -> Result<Vec<P::Item>, InstanceError> {
        let handle = self.registry.get(instance_id)?;
        Ok(handle
            .store
            .with(|state| state.current_page_products().to_vec()))
    }

    /// Page window summary for the instance
    pub fn get_page_info(&self, instance_id: &str) -> Result<PageInfo, InstanceError> {
        let handle = self.registry.get(instance_id)?;
        Ok(handle.store.with(|state| PageInfo::from(state)))
    }

    /// Snapshot of the instance state
    pub fn state(&self, instance_id: &str) -> Result<RecommendationState<P::Item>, InstanceError> {
        Ok(self.registry.get(instance_id)?.store.get())
    }

    /// The instance's observable store
    pub fn store(
        &self,
        instance_id: &str,
    ) -> Result<Store<RecommendationState<P::Item>>, InstanceError> {
        Ok(self.registry.get(instance_id)?.store)
    }

    /// Call `listener` with the full state after every change to the instance
    pub fn subscribe<F>(&self, instance_id: &str, listener: F) -> Result<Subscription, InstanceError>
    where
        F: Fn(&RecommendationState<P::Item>) + Send + Sync + 'static,
    {
        Ok(self.registry.get(instance_id)?.store.subscribe(listener))
    }

    /// Receiver for async consumers of the instance state
    pub fn watch(
        &self,
        instance_id: &str,
    ) -> Result<watch::Receiver<RecommendationState<P::Item>>, InstanceError> {
        Ok(self.registry.get(instance_id)?.store.watch())
    }

    /// Advance one page, wrapping from the last page to the first
    pub fn next_page(&self, instance_id: &str) -> Result<(), InstanceError> {
        self.navigate(instance_id, |state| {
            let target = if state.is_last_page {
                1
            } else {
                state.current_page + 1
            };
            Some(target)
        })
    }

    /// Go back one page, wrapping from the first page to the last
    pub fn previous_page(&self, instance_id: &str) -> Result<(), InstanceError> {
        self.navigate(instance_id, |state| {
            let target = if state.is_first_page {
                state.total_pages
            } else {
                state.current_page - 1
            };
            Some(target)
        })
    }

    /// Go to page `page` (1-based). Pages outside `1..=total_pages` are ignored.
    pub fn go_to_page(&self, instance_id: &str, page: usize) -> Result<(), InstanceError> {
        self.navigate(instance_id, |state| {
            (1..=state.total_pages).contains(&page).then_some(page)
        })
    }

    pub fn jump_to_first_page(&self, instance_id: &str) -> Result<(), InstanceError> {
        self.go_to_page(instance_id, 1)
    }

    pub fn jump_to_last_page(&self, instance_id: &str) -> Result<(), InstanceError> {
        let handle = self.registry.get(instance_id)?;
        let last = handle.store.with(|state| state.total_pages);
        self.go_to_page(instance_id, last)
    }

    /// Change the UI page size, keeping the first visible item on screen.
    ///
    /// Sizes below one are rejected without touching state. Sizes arrive signed
    /// because UI controls hand them over unvalidated.
    pub fn set_page_size(&self, instance_id: &str, size: i64) -> RecommendationResult<()> {
        let handle = self.registry.get(instance_id)?;
        let new_size = usize::try_from(size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or(InvalidPageSize(size))?;

        handle.store.update(|state| {
            if !state.products.is_empty() {
                state.current_page =
                    reposition_for_page_size(state.current_page, state.ui_page_size, new_size);
            }
            state.ui_page_size = new_size;
            state.recompute_pagination();
        });
        crate::log_navigation!(
            "Instance '{}' page size set to {}",
            instance_id,
            new_size
        );
        Ok(())
    }

    /// Empty the shared cache for every instance
    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    /// Purge expired cache entries. Returns the number removed.
    pub fn clean_cache(&self) -> usize {
        self.cache().cleanup_expired()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Remove an instance. Its state resets to empty for lingering subscribers.
    pub fn destroy(&self, instance_id: &str) -> bool {
        self.registry.destroy(instance_id)
    }

    /// Registered instance ids, sorted
    pub fn instances(&self) -> Vec<String> {
        self.registry.list()
    }

    fn navigate<F>(&self, instance_id: &str, target: F) -> Result<(), InstanceError>
    where
        F: FnOnce(&RecommendationState<P::Item>) -> Option<usize>,
    {
        let handle = self.registry.get(instance_id)?;
        let page = handle.store.with(|state| {
            if state.products.is_empty() {
                None
            } else {
                target(state)
            }
        });

        if let Some(page) = page {
            handle.store.update(|state| {
                state.current_page = page;
                state.recompute_pagination();
            });
            crate::log_navigation!("Instance '{}' moved to page {}", instance_id, page);
        }
        Ok(())
    }
}

/// Applies fetch lifecycle events to one instance registration, guarded by its
/// current cache key and store
struct InstanceHooks<'a, T> {
    registry: &'a InstanceRegistry<T>,
    handle: &'a InstanceHandle<T>,
}

impl<T: crate::types::ItemBounds> InstanceHooks<'_, T> {
    fn is_current(&self, cache_key: &str) -> bool {
        let is_current = self.registry.is_current(self.handle, cache_key);
        if !is_current {
            crate::debug_log!(
                "⏭️ [STALE] Ignoring result for '{}': key {} or its registration is no longer current",
                self.handle.id,
                cache_key
            );
        }
        is_current
    }
}

impl<T: crate::types::ItemBounds> FetchHooks<T> for InstanceHooks<'_, T> {
    fn on_pending(&self, cache_key: &str) {
        if self.is_current(cache_key) {
            self.handle.store.update(RecommendationState::mark_fetching);
        }
    }

    fn on_done(&self, cache_key: &str, response: &RecommendationResponse<T>, _from_cache: bool) {
        if !self.is_current(cache_key) {
            return;
        }
        self.handle.store.update(|state| {
            state.products = response.products.clone();
            state.raw_response = response.raw_response.clone();
            state.metadata = Some(response.metadata.clone());
            state.recompute_pagination();
            state.loading = false;
            state.error = None;
            state.status = FetchStatus::Succeeded;
            state.last_fetched = Some(SystemTime::now());
            state.cache_key = Some(cache_key.to_string());
        });
    }

    fn on_cancelled(&self, cache_key: &str) {
        if self.is_current(cache_key) {
            self.handle.store.update(RecommendationState::mark_cancelled);
        }
    }

    fn on_failed(&self, cache_key: &str, error: &FetchError) {
        if self.is_current(cache_key) {
            let message = error.message().to_string();
            self.handle
                .store
                .update(|state| state.mark_failed(message));
        }
    }
}

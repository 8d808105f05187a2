//! # Instance Registry
//!
//! Every recommendation widget on a page is a named instance with its own config,
//! cache key and state lane. The registry is an explicit value owned by the
//! manager rather than module-level state, so tests and multiple managers stay
//! isolated.
//!
//! Lifecycle per id: `Unregistered -> Initialized(config) -> [re-init replaces
//! config] -> Destroyed`. A later `register` of a destroyed id starts fresh.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    config::RecommendationConfig,
    errors::InstanceError,
    fingerprint::fingerprint,
    platform::Instant,
    state::RecommendationState,
    store::Store,
    types::ItemBounds,
};

/// Everything an instance-scoped operation needs, cloned out of the registry
pub struct InstanceHandle<T> {
    pub id: String,
    pub config: RecommendationConfig,
    pub cache_key: String,
    pub store: Store<RecommendationState<T>>,
}

impl<T> Clone for InstanceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            config: self.config.clone(),
            cache_key: self.cache_key.clone(),
            store: self.store.clone(),
        }
    }
}

struct InstanceEntry<T> {
    config: RecommendationConfig,
    cache_key: String,
    store: Store<RecommendationState<T>>,
    last_used: Instant,
}

/// Whether `register` created a new instance or replaced an existing config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    Updated,
}

/// Registry of named recommendation instances
pub struct InstanceRegistry<T> {
    instances: Arc<Mutex<HashMap<String, InstanceEntry<T>>>>,
}

impl<T> Clone for InstanceRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            instances: self.instances.clone(),
        }
    }
}

impl<T: ItemBounds> Default for InstanceRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ItemBounds> InstanceRegistry<T> {
    pub fn new() -> Self {
        Self {
            instances: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create the instance, or replace its config if it already exists.
    ///
    /// A replaced config keeps the instance's store. If the request fingerprint is
    /// unchanged the fetched batch is kept and only the UI page size is updated;
    /// otherwise the state starts over empty. The caller must validate the config
    /// first.
    pub fn register(&self, id: &str, config: RecommendationConfig) -> Registration {
        let cache_key = fingerprint(&config);
        let ui_page_size = config.ui_page_size();

        let updated = {
            let mut instances = self.lock();
            match instances.get_mut(id) {
                Some(entry) => {
                    let key_changed = entry.cache_key != cache_key;
                    entry.config = config;
                    entry.cache_key = cache_key.clone();
                    entry.last_used = Instant::now();
                    Some((entry.store.clone(), key_changed))
                }
                None => {
                    let mut initial = RecommendationState::new(ui_page_size);
                    initial.cache_key = Some(cache_key.clone());
                    instances.insert(
                        id.to_string(),
                        InstanceEntry {
                            config,
                            cache_key: cache_key.clone(),
                            store: Store::new(initial),
                            last_used: Instant::now(),
                        },
                    );
                    None
                }
            }
        };

        match updated {
            Some((store, key_changed)) => {
                store.update(|state| {
                    if key_changed {
                        *state = RecommendationState::new(ui_page_size);
                    }
                    state.cache_key = Some(cache_key);
                    state.ui_page_size = ui_page_size;
                    state.recompute_pagination();
                });
                crate::debug_log!("🔧 [REGISTRY] Updated config for instance: {}", id);
                Registration::Updated
            }
            None => {
                crate::debug_log!("🆕 [REGISTRY] Registered instance: {}", id);
                Registration::Created
            }
        }
    }

    /// Look up an instance and mark it as used.
    pub fn get(&self, id: &str) -> Result<InstanceHandle<T>, InstanceError> {
        let mut instances = self.lock();
        let entry = instances
            .get_mut(id)
            .ok_or_else(|| InstanceError::NotFound(id.to_string()))?;
        entry.last_used = Instant::now();

        Ok(InstanceHandle {
            id: id.to_string(),
            config: entry.config.clone(),
            cache_key: entry.cache_key.clone(),
            store: entry.store.clone(),
        })
    }

    /// True while `handle` still describes the live registration of its id with
    /// `cache_key`. A destroy followed by a new `register` yields a new store, so
    /// handles from before the destroy stop being current even for the same key.
    pub fn is_current(&self, handle: &InstanceHandle<T>, cache_key: &str) -> bool {
        self.lock()
            .get(&handle.id)
            .is_some_and(|entry| entry.cache_key == cache_key && entry.store.ptr_eq(&handle.store))
    }

    /// Remove an instance. Its store is reset to the initial empty state so any
    /// remaining subscribers see the instance go away.
    pub fn destroy(&self, id: &str) -> bool {
        let removed = self.lock().remove(id);
        match removed {
            Some(entry) => {
                let ui_page_size = entry.config.ui_page_size();
                entry.store.set(RecommendationState::new(ui_page_size));
                crate::debug_log!("🗑️ [REGISTRY] Destroyed instance: {}", id);
                true
            }
            None => false,
        }
    }

    /// Instance ids, sorted
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Time since each instance was last used, for diagnostics
    pub fn idle_times(&self) -> Vec<(String, std::time::Duration)> {
        let mut idle: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.last_used.elapsed()))
            .collect();
        idle.sort_by(|a, b| a.0.cmp(&b.0));
        idle
    }

    /// True if both handles share the same underlying registry
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instances, &other.instances)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, InstanceEntry<T>>> {
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

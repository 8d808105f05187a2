//! State: per-instance recommendation state
//!
//! This module provides [`RecommendationState`], the value every instance exposes
//! to subscribers, the [`FetchStatus`] lifecycle enum, and the [`AsyncState`]
//! trait for reading either in a uniform way.

use serde::Serialize;

use crate::{
    pagination::calculate_pagination,
    platform::{DEFAULT_UI_PAGE_SIZE, SystemTime},
    provider::ResponseMetadata,
};

/// Uniform read access to fetch outcomes, for UI code that renders a
/// loading / ready / failed switch without matching on [`FetchStatus`]
pub trait AsyncState {
    /// Payload of a successful fetch
    type Data;
    /// Message of a failed fetch
    type Error;

    /// A network request is in flight
    fn is_loading(&self) -> bool;

    /// The last fetch applied a batch
    fn is_success(&self) -> bool;

    /// The last fetch failed
    fn is_error(&self) -> bool;

    /// The fetched batch, once one has been applied
    fn data(&self) -> Option<&Self::Data>;

    /// The last failure message
    fn error(&self) -> Option<&Self::Error>;
}

/// Lifecycle of the most recent fetch for an instance
///
/// `Idle -> Fetching -> Succeeded | Failed`, and back to `Fetching` on the next
/// fetch. A cache hit goes straight from `Idle` (or any settled state) to
/// `Succeeded`. An abandoned fetch drops back from `Fetching` to the last
/// settled outcome.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "message")]
pub enum FetchStatus {
    /// Nothing fetched yet
    #[default]
    Idle,
    /// A network request is in flight
    Fetching,
    /// The last fetch applied a batch
    Succeeded,
    /// The last fetch failed
    Failed(String),
}

impl FetchStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, FetchStatus::Succeeded | FetchStatus::Failed(_))
    }
}

/// Observable state of one recommendation instance
///
/// `products` is the whole over-fetched batch; the current page is the
/// `page_start_index..page_end_index` slice of it. The pagination fields are only
/// ever written together through [`PaginationInfo::apply_to`](crate::pagination::PaginationInfo::apply_to).
#[derive(Clone, PartialEq, Debug)]
pub struct RecommendationState<T> {
    pub products: Vec<T>,
    pub current_page: usize,
    pub ui_page_size: usize,
    pub total_pages: usize,
    pub total_products: usize,
    pub page_start_index: usize,
    pub page_end_index: usize,
    pub is_first_page: bool,
    pub is_last_page: bool,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub status: FetchStatus,
    pub raw_response: Option<serde_json::Value>,
    pub metadata: Option<ResponseMetadata>,
    pub last_fetched: Option<SystemTime>,
    pub cache_key: Option<String>,
}

impl<T> RecommendationState<T> {
    /// Empty state for an instance showing `ui_page_size` items per page
    pub fn new(ui_page_size: usize) -> Self {
        let mut state = Self {
            products: Vec::new(),
            current_page: 1,
            ui_page_size,
            total_pages: 1,
            total_products: 0,
            page_start_index: 0,
            page_end_index: 0,
            is_first_page: true,
            is_last_page: true,
            has_next_page: false,
            has_previous_page: false,
            loading: false,
            error: None,
            status: FetchStatus::Idle,
            raw_response: None,
            metadata: None,
            last_fetched: None,
            cache_key: None,
        };
        state.recompute_pagination();
        state
    }

    /// Re-derive every pagination field from `(current_page, ui_page_size, products.len())`.
    pub fn recompute_pagination(&mut self) {
        calculate_pagination(self.current_page, self.ui_page_size, self.products.len())
            .apply_to(self);
    }

    /// Items on the current page
    pub fn current_page_products(&self) -> &[T] {
        let end = self.page_end_index.min(self.products.len());
        let start = self.page_start_index.min(end);
        &self.products[start..end]
    }

    pub(crate) fn mark_fetching(&mut self) {
        self.loading = true;
        self.error = None;
        self.status = FetchStatus::Fetching;
    }

    pub(crate) fn mark_failed(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message.clone());
        self.status = FetchStatus::Failed(message);
    }

    /// The in-flight fetch was abandoned; fall back to whatever was applied last.
    pub(crate) fn mark_cancelled(&mut self) {
        self.loading = false;
        if self.status == FetchStatus::Fetching {
            self.status = if self.last_fetched.is_some() {
                FetchStatus::Succeeded
            } else {
                FetchStatus::Idle
            };
        }
    }
}

impl<T> Default for RecommendationState<T> {
    fn default() -> Self {
        Self::new(DEFAULT_UI_PAGE_SIZE)
    }
}

impl<T> AsyncState for RecommendationState<T> {
    type Data = Vec<T>;
    type Error = String;

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn is_success(&self) -> bool {
        matches!(self.status, FetchStatus::Succeeded)
    }

    fn is_error(&self) -> bool {
        matches!(self.status, FetchStatus::Failed(_))
    }

    fn data(&self) -> Option<&Vec<T>> {
        match self.status {
            FetchStatus::Succeeded => Some(&self.products),
            _ => None,
        }
    }

    fn error(&self) -> Option<&String> {
        self.error.as_ref()
    }
}

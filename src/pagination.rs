//! # Client-side Pagination
//!
//! The recommendation API has no server-side paging, so every instance holds one
//! over-fetched batch and derives its page window here. [`calculate_pagination`]
//! is the only place that computes the derived fields, and
//! [`PaginationInfo::apply_to`] is the only place that writes them into state.

use std::ops::Range;

use serde::Serialize;

use crate::state::RecommendationState;

/// Derived page window for a batch of `total_items`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_start_index: usize,
    pub page_end_index: usize,
    pub is_first_page: bool,
    pub is_last_page: bool,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationInfo {
    /// Index range of the current page within the batch
    pub fn range(&self) -> Range<usize> {
        self.page_start_index..self.page_end_index
    }

    /// Number of items on the current page
    pub fn items_on_page(&self) -> usize {
        self.page_end_index - self.page_start_index
    }

    /// Write every derived field into `state` at once.
    pub fn apply_to<T>(&self, state: &mut RecommendationState<T>) {
        state.current_page = self.current_page;
        state.ui_page_size = self.page_size;
        state.total_pages = self.total_pages;
        state.total_products = self.total_items;
        state.page_start_index = self.page_start_index;
        state.page_end_index = self.page_end_index;
        state.is_first_page = self.is_first_page;
        state.is_last_page = self.is_last_page;
        state.has_next_page = self.has_next_page;
        state.has_previous_page = self.has_previous_page;
    }
}

/// Compute the page window for `current_page` (1-based).
///
/// Out-of-range pages are clamped into `1..=total_pages`. An empty batch is a
/// single empty page. A `page_size` of zero is treated as one; callers validate
/// page sizes before they get here.
pub fn calculate_pagination(
    current_page: usize,
    page_size: usize,
    total_items: usize,
) -> PaginationInfo {
    let page_size = page_size.max(1);
    let total_pages = total_items.div_ceil(page_size).max(1);
    let current_page = current_page.clamp(1, total_pages);

    let page_start_index = ((current_page - 1) * page_size).min(total_items);
    let page_end_index = (page_start_index + page_size).min(total_items);

    let is_first_page = current_page == 1;
    let is_last_page = current_page == total_pages;

    PaginationInfo {
        current_page,
        page_size,
        total_pages,
        total_items,
        page_start_index,
        page_end_index,
        is_first_page,
        is_last_page,
        has_next_page: !is_last_page,
        has_previous_page: !is_first_page,
    }
}

/// Page (1-based) that contains the first item of `current_page` once the page
/// size changes from `old_size` to `new_size`.
pub fn reposition_for_page_size(current_page: usize, old_size: usize, new_size: usize) -> usize {
    let first_visible = current_page.saturating_sub(1) * old_size.max(1);
    first_visible / new_size.max(1) + 1
}

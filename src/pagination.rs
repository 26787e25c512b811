//! Pagination Module
//!
//! Page/limit/search/filter state for one paginated resource, and the query
//! parameters derived from it.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::debounce::{Debouncer, DEFAULT_SEARCH_DELAY};
use crate::error::CacheError;

/// Filter value that selects signed contracts.
const SIGNED_FILTER: &str = "signed";

// == Page Size ==
/// Allowed page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    Ten,
    #[default]
    Twenty,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Ten,
        PageSize::Twenty,
        PageSize::Fifty,
        PageSize::Hundred,
    ];

    pub fn get(self) -> u32 {
        match self {
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = CacheError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or_else(|| {
                CacheError::InvalidRequest(format!(
                    "Page size {} not allowed (expected 10, 20, 50 or 100)",
                    value
                ))
            })
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

// == Options ==
/// Initial values and search debouncing for a [`Pagination`].
#[derive(Debug, Clone)]
pub struct PaginationOptions {
    pub initial_page: u32,
    pub initial_limit: PageSize,
    pub initial_search: String,
    pub initial_filter: String,
    pub enable_debouncing: bool,
    pub search_delay: Duration,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            initial_page: 1,
            initial_limit: PageSize::Twenty,
            initial_search: String::new(),
            initial_filter: String::new(),
            enable_debouncing: true,
            search_delay: DEFAULT_SEARCH_DELAY,
        }
    }
}

// == State ==
/// Snapshot of the raw pagination state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub page: u32,
    pub limit: PageSize,
    pub search: String,
    pub filter: String,
}

// == Query Params ==
/// Query parameters for a paginated backend request.
///
/// The filter is written under `status`, `user_type` and `signed_only` at
/// once; each backend resource reads the key it understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParams {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_only: Option<bool>,
}

impl QueryParams {
    /// Returns the present parameters as name/value pairs, in a stable order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(user_type) = &self.user_type {
            pairs.push(("user_type", user_type.clone()));
        }
        if let Some(signed_only) = self.signed_only {
            pairs.push(("signed_only", signed_only.to_string()));
        }
        pairs
    }

    /// Cache key identifying this exact page request.
    ///
    /// Values are percent-encoded so a search term can never forge another
    /// parameter.
    pub fn cache_key(&self, resource: &str) -> String {
        let parts: Vec<String> = self
            .to_pairs()
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(&value)))
            .collect();
        format!("{}:{}", resource, parts.join("&"))
    }
}

// == Pagination ==
/// Pagination state manager for one view.
///
/// Changing search, filter or limit sends the view back to page 1.
#[derive(Debug)]
pub struct Pagination {
    page: u32,
    limit: PageSize,
    search: String,
    filter: String,
    total: u64,
    debounced_search: Debouncer<String>,
    options: PaginationOptions,
}

impl Pagination {
    pub fn new(options: PaginationOptions, clock: SharedClock) -> Self {
        let delay = if options.enable_debouncing {
            options.search_delay
        } else {
            Duration::ZERO
        };

        Self {
            page: options.initial_page.max(1),
            limit: options.initial_limit,
            search: options.initial_search.clone(),
            filter: options.initial_filter.clone(),
            total: 0,
            debounced_search: Debouncer::new(options.initial_search.clone(), delay, clock),
            options,
        }
    }

    // == Setters ==
    /// Moves to page `page` (at least 1).
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_limit(&mut self, limit: PageSize) {
        self.limit = limit;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        self.debounced_search.set(search.clone());
        self.search = search;
        self.page = 1;
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.page = 1;
    }

    /// Records the total item count reported by the last fetch.
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    /// Restores the initial page, limit, search and filter.
    pub fn reset(&mut self) {
        self.page = self.options.initial_page.max(1);
        self.limit = self.options.initial_limit;
        self.search = self.options.initial_search.clone();
        self.filter = self.options.initial_filter.clone();
        self.debounced_search.cancel();
        self.debounced_search.set(self.search.clone());
        self.debounced_search.flush();
    }

    // == Getters ==
    pub fn state(&self) -> PaginationState {
        PaginationState {
            page: self.page,
            limit: self.limit,
            search: self.search.clone(),
            filter: self.filter.clone(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> PageSize {
        self.limit
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Search term used for queries: debounced, or raw when debouncing is off.
    pub fn effective_search(&mut self) -> String {
        if self.options.enable_debouncing {
            self.debounced_search.value().clone()
        } else {
            self.search.clone()
        }
    }

    // == Query Params ==
    pub fn query_params(&mut self) -> QueryParams {
        let search = non_blank(&self.effective_search());
        let filter = non_blank(&self.filter);

        QueryParams {
            page: self.page,
            limit: self.limit.get(),
            search,
            status: filter.clone(),
            user_type: filter.clone(),
            signed_only: filter.map(|f| f == SIGNED_FILTER),
        }
    }

    // == Window ==
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.get()))
    }

    /// 1-based first and last item shown on the current page; `(0, 0)` when empty.
    pub fn item_range(&self) -> (u64, u64) {
        if self.total == 0 {
            return (0, 0);
        }
        let limit = u64::from(self.limit.get());
        let start = u64::from(self.page - 1) * limit + 1;
        let end = (u64::from(self.page) * limit).min(self.total);
        (start.min(self.total), end)
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

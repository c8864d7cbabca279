//! Runtime configuration shared by the gateway, query engine and effects

use std::time::Duration;

pub const API_BASE: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_PAGE_SIZE: usize = 24;
pub const UNFILTERED_CAP: usize = 300;
pub const SEARCH_DEBOUNCE_MS: u64 = 300;
pub const LOOKUP_CONCURRENCY: usize = 12;
pub const MAX_LINEAGE_DEPTH: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the PokeAPI v2 REST root, without a trailing slash
    pub api_base: String,
    pub page_size: usize,
    /// Upper bound on the listing used when no filter group is selected
    pub unfiltered_cap: usize,
    pub search_debounce: Duration,
    pub detail_timeout: Duration,
    pub request_timeout: Duration,
    pub lookup_concurrency: usize,
    pub max_lineage_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            unfiltered_cap: UNFILTERED_CAP,
            search_debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            detail_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            lookup_concurrency: LOOKUP_CONCURRENCY,
            max_lineage_depth: MAX_LINEAGE_DEPTH,
        }
    }
}

impl Config {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }

    pub fn with_detail_timeout(mut self, timeout: Duration) -> Self {
        self.detail_timeout = timeout;
        self
    }
}

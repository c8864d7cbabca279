//! Application state - single source of truth for the catalog view

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;

use crate::config::DEFAULT_PAGE_SIZE;

/// Card-level data for one catalog entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogEntry {
    pub name: String,
    pub id: u16,
    pub sprite_url: Option<String>,
    pub types: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntryStat {
    pub name: String,
    pub base: u16,
}

/// Everything the details modal shows for one entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FullEntry {
    pub entry: CatalogEntry,
    /// Decimeters
    pub height: u16,
    /// Hectograms
    pub weight: u16,
    pub stats: Vec<EntryStat>,
    pub abilities: Vec<String>,
    /// Whole lineage, root first, depth-first across branches
    pub evolution: Vec<CatalogEntry>,
    pub images: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ListStatus {
    #[default]
    Idle,
    Refreshing,
    Appending,
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchState {
    /// Whether the search line is capturing keystrokes
    pub editing: bool,
    /// Text as typed
    pub raw: String,
    /// Trimmed, lowercased text the current list was built from
    pub settled: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct DetailModal {
    pub target: String,
    pub detail: DataResource<FullEntry>,
    pub image_index: usize,
    pub evolution_index: usize,
}

impl DetailModal {
    pub fn loading(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            detail: DataResource::Loading,
            image_index: 0,
            evolution_index: 0,
        }
    }

    pub fn image(&self) -> Option<&str> {
        self.detail
            .data()
            .and_then(|detail| detail.images.get(self.image_index))
            .map(String::as_str)
    }
}

#[derive(Clone, Debug, tui_dispatch::DebugState, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppState {
    #[debug(section = "Filters", label = "Groups", debug_fmt)]
    pub selected_groups: Vec<String>,

    #[debug(section = "Filters", label = "Search", debug_fmt)]
    pub search: SearchState,

    /// Sorted base-form names for the current generation
    #[debug(skip)]
    pub candidates: Vec<String>,

    #[debug(skip)]
    pub entries: Vec<CatalogEntry>,

    #[debug(section = "List", label = "Page")]
    pub page: usize,

    #[debug(section = "List", label = "Page size")]
    pub page_size: usize,

    #[debug(section = "List", label = "Has more")]
    pub has_more: bool,

    #[debug(section = "List", label = "Status", debug_fmt)]
    pub list_status: ListStatus,

    /// Bumped on every refresh; results tagged with an older value are dropped
    #[debug(section = "List", label = "Generation")]
    pub generation: u64,

    #[debug(section = "List", label = "Selected")]
    pub selected_index: usize,

    #[debug(section = "Detail", label = "Modal", debug_fmt)]
    pub modal: Option<DetailModal>,

    #[debug(section = "Status", label = "Message", debug_fmt)]
    pub message: Option<String>,

    #[debug(skip)]
    pub terminal_size: (u16, u16),
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl AppState {
    pub fn new(page_size: usize) -> Self {
        Self {
            selected_groups: Vec::new(),
            search: SearchState::default(),
            candidates: Vec::new(),
            entries: Vec::new(),
            page: 0,
            page_size: page_size.max(1),
            has_more: false,
            list_status: ListStatus::Idle,
            generation: 0,
            selected_index: 0,
            modal: None,
            message: None,
            terminal_size: (80, 24),
        }
    }

    pub fn is_group_selected(&self, id: &str) -> bool {
        self.selected_groups.iter().any(|group| group == id)
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.list_status,
            ListStatus::Refreshing | ListStatus::Appending
        )
    }

    pub fn selected_entry(&self) -> Option<&CatalogEntry> {
        self.entries.get(self.selected_index)
    }

    pub fn set_selected_index(&mut self, index: usize) -> bool {
        if self.entries.is_empty() {
            self.selected_index = 0;
            return false;
        }
        let bounded = index.min(self.entries.len() - 1);
        if bounded != self.selected_index {
            self.selected_index = bounded;
            return true;
        }
        false
    }

    pub fn current_detail(&self) -> Option<&FullEntry> {
        self.modal.as_ref().and_then(|modal| modal.detail.data())
    }
}

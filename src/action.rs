//! Actions: user intents and async results

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::{CatalogEntry, FullEntry};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    /// Build the first, unfiltered listing
    Init,

    // ===== Filter category =====
    /// Toggle a filter group by id
    FilterToggle(String),
    FilterClear,

    // ===== Search category =====
    SearchStart,
    SearchClose,
    /// Raw search text changed (debounced before it refreshes the list)
    SearchInput(String),
    /// Result: search text stayed unchanged for the debounce window
    SearchDidSettle(String),

    // ===== Catalog category =====
    CatalogDidLoad {
        generation: u64,
        candidates: Vec<String>,
        entries: Vec<CatalogEntry>,
    },
    CatalogDidError {
        generation: u64,
        error: String,
    },
    /// Result: the generation was superseded before it finished
    CatalogDidCancel {
        generation: u64,
    },

    // ===== Page category =====
    PageLoadMore,
    PageDidLoad {
        generation: u64,
        page: usize,
        entries: Vec<CatalogEntry>,
    },
    PageDidError {
        generation: u64,
        error: String,
    },

    // ===== Selection category =====
    SelectionMove(i16),
    SelectionSet(usize),

    // ===== Detail category =====
    DetailOpen(String),
    DetailDidLoad {
        name: String,
        detail: FullEntry,
    },
    DetailDidError {
        name: String,
        error: String,
    },
    DetailDidCancel {
        name: String,
    },
    DetailClose,
    DetailImageSelect(usize),
    DetailImageNext,
    DetailImagePrev,
    DetailEvolutionSelect(usize),

    // ===== UI category =====
    UiTerminalResize(u16, u16),

    Quit,
}

//! Effects - side effects declared by the reducer

/// Side effects that can be triggered by actions
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Rebuild the candidate list and load its first page, superseding any
    /// earlier generation
    Refresh {
        generation: u64,
        groups: Vec<String>,
        search: String,
        page_size: usize,
    },
    /// Resolve the cards of one more page within the same generation
    LoadPage {
        generation: u64,
        page: usize,
        names: Vec<String>,
    },
    /// Report the text back once typing pauses
    DebounceSearch { text: String },
    LoadDetail { name: String },
    CancelDetail,
}

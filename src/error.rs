#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("request failed: {0}")]
    Transient(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("lineage of {0} did not terminate")]
    AmbiguousLineage(String),
    #[error("timed out loading {0}")]
    Timeout(String),
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl CatalogError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CatalogError::Cancelled)
    }
}

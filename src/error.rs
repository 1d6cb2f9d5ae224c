use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("page index {index} is out of range (document has {page_count} pages)")]
    PageOutOfRange { index: usize, page_count: usize },

    #[error("invalid schedule catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("unknown schedule: {0}")]
    UnknownSchedule(String),
}

use std::path::Path;

use crate::error::ExtractError;
use crate::model::Token;

pub trait WordSource {
    fn page_count(&self) -> usize;

    fn page_tokens(&self, index: usize) -> Result<Vec<Token>, ExtractError>;
}

/// Pages of words held in memory, e.g. a word dump produced by another extractor.
///
/// The JSON form is an array of pages, each an array of `{text, x0, top}`
/// objects; other fields are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryWordSource {
    pages: Vec<Vec<Token>>,
}

impl InMemoryWordSource {
    pub fn new(pages: Vec<Vec<Token>>) -> Self {
        Self { pages }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ExtractError> {
        let pages: Vec<Vec<Token>> = serde_json::from_str(json)?;
        Ok(Self::new(pages))
    }

    pub fn from_json_path(path: &Path) -> Result<Self, ExtractError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl WordSource for InMemoryWordSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_tokens(&self, index: usize) -> Result<Vec<Token>, ExtractError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or(ExtractError::PageOutOfRange {
                index,
                page_count: self.pages.len(),
            })
    }
}

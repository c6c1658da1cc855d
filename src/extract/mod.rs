//! Extraction boundary to the LLM collaborator.
//!
//! The [`Extractor`] trait decouples the poll-cycle coordinator from the
//! LLM call mechanics. The production implementation is
//! [`LlmExtractor`]; tests substitute mocks.

pub mod deadline;
pub mod llm;

use std::future::Future;
use std::pin::Pin;

use crate::models::extraction::ExtractedTask;
use crate::models::item::{ActionableItem, SourceType};
use crate::Result;

pub use llm::LlmExtractor;

/// Additional context passed alongside the item text.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    /// Known sender or author of the originating item.
    pub sender: Option<String>,
}

/// Turns raw item text into structured task candidates.
///
/// Implementations are held as trait objects by the coordinator, so the
/// async method returns a boxed future rather than using `async fn`.
pub trait Extractor: Send + Sync {
    /// Extract task candidates from one item's composite text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Extraction`](crate::AppError::Extraction) on an
    /// LLM call or response-parsing failure.
    fn extract<'a>(
        &'a self,
        text: &'a str,
        source: SourceType,
        context: Option<&'a ExtractionContext>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ExtractedTask>>> + Send + 'a>>;
}

/// Build the composite text handed to the extractor for one item.
///
/// Concatenates the title, the body text, and a known-sender hint, each
/// on its own line.
#[must_use]
pub fn composite_text(item: &ActionableItem) -> String {
    let mut text = item.title.clone();
    if let Some(ref description) = item.description {
        text.push('\n');
        text.push_str(description);
    }
    if let Some(sender) = item.sender() {
        text.push('\n');
        text.push_str("From: ");
        text.push_str(sender);
    }
    text
}

//! Invoice field extraction module.

mod parser;
pub mod rules;

use std::path::Path;

pub use parser::HtmlInvoiceParser;

use crate::error::Result;
use crate::models::{ExtractionResult, InvoiceRecord};

/// Trait for invoice extractors.
pub trait InvoiceExtractor {
    /// Extract an invoice from an HTML string.
    fn extract(&self, html: &str) -> ExtractionResult<InvoiceRecord>;

    /// Extract an invoice from a file, recording its path relative to `root`.
    fn extract_file(&self, path: &Path, root: &Path) -> Result<InvoiceRecord>;
}

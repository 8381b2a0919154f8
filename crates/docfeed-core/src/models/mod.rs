//! Record models and configuration.

pub mod config;
pub mod email;
pub mod form;
pub mod invoice;
pub mod record;

pub use config::FeedConfig;
pub use email::{EmailRecord, EmailType, MatchedVia};
pub use form::FormRecord;
pub use invoice::{Buyer, InvoiceRecord, LineItem, Note, Seller};
pub use record::{FeedRecord, Payload, Source, Status};

/// Output of one extractor run over one document.
#[derive(Debug, Clone)]
pub struct ExtractionResult<T> {
    /// The extracted record.
    pub record: T,
    /// Substructures that were expected but not found.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

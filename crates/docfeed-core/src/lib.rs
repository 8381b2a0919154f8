//! Core library for turning invoices, emails and form submissions into
//! one reviewable feed.
//!
//! This crate provides:
//! - HTML invoice extraction (seller, buyer, line items, VAT summary)
//! - Email parsing with a weighted invoice/client classifier
//! - Form submission extraction
//! - Invoice-number normalization with exact and fuzzy matching
//! - Feed assembly with hardening and backup-before-write persistence

pub mod email;
pub mod error;
pub mod feed;
pub mod form;
pub mod html;
pub mod invoice;
pub mod matching;
pub mod models;

pub use email::EmailParser;
pub use error::{DocumentError, FeedError, PersistenceError, Result};
pub use feed::{FeedStore, Hardener, Pipeline, RunOutput, RunReport};
pub use form::FormParser;
pub use invoice::{HtmlInvoiceParser, InvoiceExtractor};
pub use matching::{normalize_invoice_number, InvoiceIndex, Matcher};
pub use models::{
    EmailRecord, EmailType, ExtractionResult, FeedConfig, FeedRecord, FormRecord, InvoiceRecord,
    MatchedVia, Payload, Source, Status,
};

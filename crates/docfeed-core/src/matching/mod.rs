//! Invoice-number normalization and matching.

pub mod index;
pub mod normalize;
pub mod scorer;

pub use index::{InvoiceIndex, Match, Matcher};
pub use normalize::normalize_invoice_number;
pub use scorer::{scorer_for, Containment, PartialRatio, Scorer};

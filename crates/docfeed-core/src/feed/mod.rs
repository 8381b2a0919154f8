//! Reconciliation, hardening, persistence and the batch run.

pub mod harden;
pub mod pipeline;
pub mod reconcile;
pub mod store;

pub use harden::{mint_id, now_iso, Hardener};
pub use pipeline::{DocCounts, DocumentOutcome, Inputs, Pipeline, RunOutput, RunReport};
pub use reconcile::{enrich_email, enrich_emails, find_invoice_reference, MatchStats};
pub use store::{backup_file, write_json, FeedStore};

//! Invoice lookup index and the exact-then-fuzzy matcher.

use std::collections::HashMap;

use tracing::debug;

use crate::models::config::MatchingConfig;
use crate::models::{InvoiceRecord, MatchedVia};

use super::normalize::normalize_invoice_number;
use super::scorer::{scorer_for, Scorer};

/// Normalized invoice number to invoice, built once per run.
///
/// Keys keep the order in which they were first seen. A later invoice with
/// the same normalized number replaces the earlier one.
#[derive(Debug, Default)]
pub struct InvoiceIndex<'a> {
    keys: Vec<String>,
    records: HashMap<String, &'a InvoiceRecord>,
}

impl<'a> InvoiceIndex<'a> {
    /// Index every invoice with a non-empty normalized number.
    pub fn build(invoices: impl IntoIterator<Item = &'a InvoiceRecord>) -> Self {
        let mut index = Self::default();
        for invoice in invoices {
            index.insert(invoice);
        }
        index
    }

    fn insert(&mut self, invoice: &'a InvoiceRecord) {
        let key = normalize_invoice_number(&invoice.invoice_number);
        if key.is_empty() {
            return;
        }
        if let Some(previous) = self.records.insert(key.clone(), invoice) {
            debug!(
                "Invoice key {} from {} replaced by {}",
                key, previous.source_file, invoice.source_file
            );
        } else {
            self.keys.push(key);
        }
    }

    /// Invoice stored under an already-normalized key.
    pub fn get(&self, key: &str) -> Option<&'a InvoiceRecord> {
        self.records.get(key).copied()
    }

    /// Keys with their invoices, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &'a InvoiceRecord)> + '_ {
        self.keys
            .iter()
            .filter_map(|key| self.records.get(key).map(|record| (key.as_str(), *record)))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Outcome of matching one candidate number.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    /// The matched invoice; `None` below the cutoff.
    pub record: Option<&'a InvoiceRecord>,
    /// 100 for exact hits, else the best fuzzy score seen.
    pub score: u8,
    pub via: MatchedVia,
}

impl Match<'_> {
    fn unmatched(score: u8) -> Self {
        Self {
            record: None,
            score,
            via: MatchedVia::Unmatched,
        }
    }
}

/// Exact lookup with an optional fuzzy fallback.
pub struct Matcher {
    scorer: Box<dyn Scorer>,
    cutoff: u8,
    fuzzy: bool,
}

impl Matcher {
    pub fn new(scorer: Box<dyn Scorer>, cutoff: u8) -> Self {
        Self {
            scorer,
            cutoff,
            fuzzy: true,
        }
    }

    /// A matcher that never falls back to fuzzy scoring.
    pub fn exact_only() -> Self {
        Self {
            scorer: scorer_for(Default::default()),
            cutoff: 100,
            fuzzy: false,
        }
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            scorer: scorer_for(config.scorer),
            cutoff: config.cutoff,
            fuzzy: config.fuzzy,
        }
    }

    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    /// Match `candidate` against `index`.
    ///
    /// An exact normalized key always wins with score 100. Otherwise the
    /// highest-scoring key is kept, the first one seen on ties, and returned
    /// only if it reaches the cutoff. Never fails.
    pub fn find<'a>(&self, candidate: &str, index: &InvoiceIndex<'a>) -> Match<'a> {
        let key = normalize_invoice_number(candidate);
        if key.is_empty() {
            return Match::unmatched(0);
        }

        if let Some(record) = index.get(&key) {
            return Match {
                record: Some(record),
                score: 100,
                via: MatchedVia::Exact,
            };
        }

        if !self.fuzzy {
            return Match::unmatched(0);
        }

        let mut best: Option<&'a InvoiceRecord> = None;
        let mut best_score = 0;
        for (other, record) in index.iter() {
            let score = self.scorer.score(&key, other);
            if score > best_score {
                best_score = score;
                best = Some(record);
            }
        }

        match best {
            Some(record) if best_score >= self.cutoff => Match {
                record: Some(record),
                score: best_score,
                via: MatchedVia::Fuzzy,
            },
            _ => Match::unmatched(best_score),
        }
    }
}

//! Linking invoice emails to parsed invoices.

use tracing::debug;

use crate::invoice::rules::INVOICE_REFERENCE;
use crate::matching::{InvoiceIndex, Matcher};
use crate::models::{EmailRecord, MatchedVia};

/// Counts of emails linked to an invoice, by match kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub exact: usize,
    pub fuzzy: usize,
}

impl MatchStats {
    pub fn total(&self) -> usize {
        self.exact + self.fuzzy
    }
}

/// Invoice number mentioned in the subject, else in the body.
pub fn find_invoice_reference(subject: &str, body: &str) -> Option<String> {
    [subject, body].into_iter().find_map(|text| {
        INVOICE_REFERENCE
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
    })
}

/// Annotate one email with its invoice match.
///
/// `fuzzy_score` is left empty when there is no candidate number, and
/// when an exact-only matcher finds nothing.
pub fn enrich_email(email: &mut EmailRecord, index: &InvoiceIndex<'_>, matcher: &Matcher) {
    let candidate = find_invoice_reference(&email.subject, &email.body);

    let found = candidate
        .as_deref()
        .map(|number| matcher.find(number, index));

    email.matched_via = found.map_or(MatchedVia::Unmatched, |m| m.via);
    email.fuzzy_score = match found {
        Some(m) if m.via.is_matched() || matcher.is_fuzzy() => Some(m.score),
        _ => None,
    };

    let record = found.and_then(|m| m.record);
    email.matched_invoice_html = record.is_some();
    email.matched_invoice_file = record.map(|invoice| invoice.source_file.clone());
    email.matched_invoice_total = record.and_then(|invoice| invoice.total);

    debug!(
        "Email {:?}: candidate {:?}, matched via {}",
        email.subject,
        candidate,
        email.matched_via.as_str()
    );
    email.invoice_number_in_subject = candidate;
}

/// Enrich every email against a fully built index.
pub fn enrich_emails(
    emails: &mut [EmailRecord],
    index: &InvoiceIndex<'_>,
    matcher: &Matcher,
) -> MatchStats {
    let mut stats = MatchStats::default();
    for email in emails.iter_mut() {
        enrich_email(email, index, matcher);
        match email.matched_via {
            MatchedVia::Exact => stats.exact += 1,
            MatchedVia::Fuzzy => stats.fuzzy += 1,
            MatchedVia::Unmatched => {}
        }
    }
    stats
}

//! Additive scoring classifier for client vs. invoice emails.
//!
//! Signal extraction and the decision are kept apart: [`Signals::collect`]
//! reads a message, [`classify`] applies a [`ClassifierWeights`] table.

use crate::models::config::ClassifierWeights;
use crate::models::EmailType;

use super::patterns::{
    contains_any, CLIENT_CUES, INVOICE_FILENAME_HINTS, INVOICE_KEYWORDS, INVOICE_NUMBER_HINT,
    SENDER_HINTS,
};

/// Evidence gathered from one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub subject_keyword: bool,
    pub body_keyword: bool,
    pub invoice_number_in_subject: bool,
    pub sender_hint: bool,
    /// Attachment names ending in `.pdf`, placeholders included.
    pub pdf_count: usize,
    pub invoice_filename: bool,
    pub client_cue_subject: bool,
    pub client_cue_body: bool,
}

impl Signals {
    /// Gather signals from the message fields.
    pub fn collect(subject: &str, body: &str, from_addr: &str, attachment_names: &[String]) -> Self {
        let subject_lower = subject.to_lowercase();
        let body_lower = body.to_lowercase();
        let local_part = from_addr
            .split_once('@')
            .map_or(from_addr, |(local, _)| local)
            .to_lowercase();
        let names: Vec<String> = attachment_names.iter().map(|n| n.to_lowercase()).collect();

        Self {
            subject_keyword: contains_any(&subject_lower, INVOICE_KEYWORDS),
            body_keyword: contains_any(&body_lower, INVOICE_KEYWORDS),
            invoice_number_in_subject: INVOICE_NUMBER_HINT.is_match(subject),
            sender_hint: contains_any(&local_part, SENDER_HINTS),
            pdf_count: names.iter().filter(|n| n.ends_with(".pdf")).count(),
            invoice_filename: names.iter().any(|n| contains_any(n, INVOICE_FILENAME_HINTS)),
            client_cue_subject: contains_any(&subject_lower, CLIENT_CUES),
            client_cue_body: contains_any(&body_lower, CLIENT_CUES),
        }
    }

    /// Whether any positive invoice evidence exists besides body wording.
    pub fn has_invoice_signal(&self) -> bool {
        self.pdf_count > 0
            || self.subject_keyword
            || self.invoice_number_in_subject
            || self.invoice_filename
            || self.sender_hint
    }

    /// Weighted sum of the signals.
    pub fn score(&self, weights: &ClassifierWeights) -> i32 {
        let terms = [
            (self.subject_keyword, weights.subject_keyword),
            (self.body_keyword, weights.body_keyword),
            (self.invoice_number_in_subject, weights.invoice_number_in_subject),
            (self.sender_hint, weights.sender_hint),
            (self.pdf_count > 0, weights.pdf_attachment),
            (self.invoice_filename, weights.invoice_filename),
            (self.client_cue_subject, weights.client_cue_subject),
            (self.client_cue_body, weights.client_cue_body),
        ];
        terms
            .iter()
            .filter(|(present, _)| *present)
            .map(|(_, weight)| weight)
            .sum()
    }
}

/// Decide the email type.
///
/// A message without any positive invoice evidence is a client message
/// whatever its score; otherwise it is an invoice when the score reaches
/// the threshold.
pub fn classify(signals: &Signals, weights: &ClassifierWeights) -> EmailType {
    if !signals.has_invoice_signal() {
        return EmailType::Client;
    }
    if signals.score(weights) >= weights.threshold {
        EmailType::Invoice
    } else {
        EmailType::Client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_invoice_with_pdf_and_number() {
        let signals = Signals::collect(
            "Invoice INV-2024-007 due",
            "Please find the invoice attached.",
            "billing@techflow.gr",
            &names(&["invoice_2024_007.pdf"]),
        );
        assert!(signals.subject_keyword);
        assert!(signals.invoice_number_in_subject);
        assert!(signals.sender_hint);
        assert_eq!(signals.pdf_count, 1);
        assert!(signals.invoice_filename);
        assert_eq!(signals.score(&ClassifierWeights::default()), 15);
        assert_eq!(
            classify(&signals, &ClassifierWeights::default()),
            EmailType::Invoice
        );
    }

    #[test]
    fn test_client_question_without_attachments() {
        let signals = Signals::collect(
            "Question about your platform",
            "We need a CRM for our shop.",
            "maria@example.com",
            &[],
        );
        assert!(!signals.has_invoice_signal());
        assert_eq!(
            classify(&signals, &ClassifierWeights::default()),
            EmailType::Client
        );
    }

    #[test]
    fn test_body_keyword_alone_is_client() {
        // Mentioning payment in the body is not invoice evidence by itself.
        let signals = Signals::collect(
            "Hello",
            "About the payment terms of your offer",
            "nikos@example.com",
            &[],
        );
        assert!(signals.body_keyword);
        assert_eq!(
            classify(&signals, &ClassifierWeights::default()),
            EmailType::Client
        );
    }

    #[test]
    fn test_client_cues_pull_below_threshold() {
        // Sender hint (+2) and subject cue (-2) leave the score at 0.
        let signals = Signals::collect(
            "Proposal for your new website",
            "Looking forward to hearing from you",
            "accounts@agency.gr",
            &[],
        );
        assert!(signals.has_invoice_signal());
        assert_eq!(signals.score(&ClassifierWeights::default()), 0);
        assert_eq!(
            classify(&signals, &ClassifierWeights::default()),
            EmailType::Client
        );
    }

    #[test]
    fn test_placeholder_pdf_counts_as_pdf_name() {
        let signals = Signals::collect(
            "Τιμολόγιο Μαρτίου",
            "[ΣΥΝΗΜΜΕΝΟ: timologio_03.pdf]",
            "info@shop.gr",
            &names(&["timologio_03.pdf"]),
        );
        assert!(signals.subject_keyword);
        assert_eq!(signals.pdf_count, 1);
        assert_eq!(
            classify(&signals, &ClassifierWeights::default()),
            EmailType::Invoice
        );
    }

    #[test]
    fn test_custom_threshold() {
        let signals = Signals::collect("Receipt", "", "shop@example.com", &[]);
        let strict = ClassifierWeights {
            threshold: 6,
            ..ClassifierWeights::default()
        };
        assert_eq!(classify(&signals, &ClassifierWeights::default()), EmailType::Invoice);
        assert_eq!(classify(&signals, &strict), EmailType::Client);
    }
}

//! Email records extracted from raw `.eml` messages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Heuristic classification of an email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    /// A prospective or existing client writing in.
    #[default]
    Client,
    /// A message carrying or referring to an invoice.
    Invoice,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Invoice => "invoice",
        }
    }
}

/// How an email was linked to a parsed invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedVia {
    Exact,
    Fuzzy,
    /// No invoice reached the cutoff, or no candidate number was found.
    #[default]
    #[serde(rename = "none")]
    Unmatched,
}

impl MatchedVia {
    pub fn is_matched(&self) -> bool {
        !matches!(self, Self::Unmatched)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Unmatched => "none",
        }
    }
}

/// A parsed email, optionally enriched with its invoice match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailRecord {
    pub full_name: String,
    /// Sender address, lowercased.
    pub email: String,
    /// Longest digit run of 10+ digits found in subject or body.
    pub phone: String,
    pub company: String,
    pub subject: String,
    /// `Date` header as sent.
    pub date: String,
    /// Plain-text body.
    pub body: String,
    /// First `text/html` part, raw.
    pub body_html: String,
    /// Bounded prefix of `body`.
    pub body_preview: String,
    pub email_type: EmailType,
    pub has_pdf_attachments: bool,
    /// Real attachment file names followed by placeholder names.
    pub attachment_names: Vec<String>,
    /// A placeholder marker was found but no real PDF is attached.
    pub missing_attachment: bool,
    pub source_file: String,

    // Reconciliation results.
    pub invoice_number_in_subject: Option<String>,
    pub matched_invoice_html: bool,
    pub matched_invoice_file: Option<String>,
    pub matched_invoice_total: Option<Decimal>,
    pub matched_via: MatchedVia,
    pub fuzzy_score: Option<u8>,
}

impl EmailRecord {
    /// Whether an invoice-type email still lacks a confirmed invoice.
    pub fn needs_action(&self) -> bool {
        self.email_type == EmailType::Invoice
            && (self.missing_attachment || !self.has_pdf_attachments || !self.matched_invoice_html)
    }

    /// Natural key used for stable identifiers.
    pub fn natural_key(&self) -> String {
        format!("{}|{}|{}", self.email, self.subject, self.date)
    }
}

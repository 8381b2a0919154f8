//! The common envelope every record in the combined feed is wrapped in.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{EmailRecord, FormRecord, InvoiceRecord};

/// Which producer a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "form")]
    Form,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "invoice_html")]
    InvoiceHtml,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Form, Source::Email, Source::InvoiceHtml];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Email => "email",
            Self::InvoiceHtml => "invoice_html",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.as_str() == s)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Approved,
    Rejected,
    Edited,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::Approved,
        Status::Rejected,
        Status::Edited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Edited => "edited",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything outside the allowed set reads as `pending`.
fn lenient_status<'de, D>(deserializer: D) -> Result<Status, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(Status::parse)
        .unwrap_or_default())
}

/// Source-specific record body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum Payload {
    #[serde(rename = "form")]
    Form(FormRecord),
    #[serde(rename = "email")]
    Email(EmailRecord),
    #[serde(rename = "invoice_html")]
    Invoice(InvoiceRecord),
}

impl Payload {
    pub fn source(&self) -> Source {
        match self {
            Self::Form(_) => Source::Form,
            Self::Email(_) => Source::Email,
            Self::Invoice(_) => Source::InvoiceHtml,
        }
    }

    pub fn source_file(&self) -> &str {
        match self {
            Self::Form(form) => &form.source_file,
            Self::Email(email) => &email.source_file,
            Self::Invoice(invoice) => &invoice.source_file,
        }
    }

    /// Document-level key combined with `source_file` for stable ids.
    pub fn natural_key(&self) -> String {
        match self {
            Self::Form(form) => form.natural_key(),
            Self::Email(email) => email.natural_key(),
            Self::Invoice(invoice) => invoice.natural_key().to_string(),
        }
    }
}

/// A record of any source, with its lifecycle metadata.
///
/// Serialized flat: envelope fields, `source`, then payload fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    #[serde(default)]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Status,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub schema_version: String,

    #[serde(default)]
    pub needs_action: bool,

    #[serde(flatten)]
    pub payload: Payload,
}

impl FeedRecord {
    /// Wrap a freshly extracted payload. Metadata is filled in by hardening.
    pub fn new(payload: Payload) -> Self {
        Self {
            id: String::new(),
            status: Status::Pending,
            created_at: String::new(),
            schema_version: String::new(),
            needs_action: false,
            payload,
        }
    }

    pub fn source(&self) -> Source {
        self.payload.source()
    }

    /// Decode a loosely shaped JSON object from any producer.
    ///
    /// A missing or unknown `source` is inferred from the fields present:
    /// `email_type` means email, `invoice_number` means invoice, anything
    /// else is a form.
    pub fn from_value(mut value: Value) -> serde_json::Result<Self> {
        if let Some(object) = value.as_object_mut() {
            let known = object
                .get("source")
                .and_then(Value::as_str)
                .and_then(Source::parse)
                .is_some();
            if !known {
                let inferred = if object.contains_key("email_type") {
                    Source::Email
                } else if object.contains_key("invoice_number") {
                    Source::InvoiceHtml
                } else {
                    Source::Form
                };
                object.insert("source".to_string(), Value::from(inferred.as_str()));
            }
        }
        serde_json::from_value(value)
    }
}

impl From<InvoiceRecord> for FeedRecord {
    fn from(record: InvoiceRecord) -> Self {
        Self::new(Payload::Invoice(record))
    }
}

impl From<EmailRecord> for FeedRecord {
    fn from(record: EmailRecord) -> Self {
        Self::new(Payload::Email(record))
    }
}

impl From<FormRecord> for FeedRecord {
    fn from(record: FormRecord) -> Self {
        Self::new(Payload::Form(record))
    }
}

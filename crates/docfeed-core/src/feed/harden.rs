//! The hardening pass: every record leaves with valid lifecycle metadata.

use chrono::Local;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::config::{FeedOptions, IdStrategy};
use crate::models::{FeedRecord, Payload};

const ID_HEX_LEN: usize = 12;

/// Fills in missing ids, timestamps and schema versions.
///
/// Running it on an already hardened record changes nothing.
#[derive(Debug, Clone)]
pub struct Hardener {
    id_strategy: IdStrategy,
    schema_version: String,
}

impl Default for Hardener {
    fn default() -> Self {
        Self::new(&FeedOptions::default())
    }
}

impl Hardener {
    pub fn new(options: &FeedOptions) -> Self {
        Self {
            id_strategy: options.id_strategy,
            schema_version: options.schema_version.clone(),
        }
    }

    /// Harden one record in place.
    pub fn harden(&self, record: &mut FeedRecord) {
        if record.id.trim().is_empty() {
            record.id = mint_id(&record.payload, self.id_strategy);
        }
        if record.created_at.trim().is_empty() {
            record.created_at = now_iso();
        }
        if record.schema_version.trim().is_empty() {
            record.schema_version = self.schema_version.clone();
        }
        match &mut record.payload {
            Payload::Email(email) => record.needs_action = email.needs_action(),
            Payload::Form(form) => form.rename_reserved_extras(),
            Payload::Invoice(_) => {}
        }
    }

    pub fn harden_all(&self, records: &mut [FeedRecord]) {
        for record in records.iter_mut() {
            self.harden(record);
        }
    }
}

/// `<source>_<12 hex>`, random or derived from the document identity.
pub fn mint_id(payload: &Payload, strategy: IdStrategy) -> String {
    let hex = match strategy {
        IdStrategy::Random => Uuid::new_v4().simple().to_string(),
        IdStrategy::Stable => {
            let identity = format!(
                "{}|{}|{}",
                payload.source(),
                payload.source_file(),
                payload.natural_key()
            );
            hex::encode(Sha256::digest(identity.as_bytes()))
        }
    };
    format!("{}_{}", payload.source(), &hex[..ID_HEX_LEN])
}

/// Local time, second precision, no offset.
pub fn now_iso() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailRecord, EmailType, FormRecord, InvoiceRecord, Status};
    use serde_json::json;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_harden_fills_missing_metadata() {
        let mut record = FeedRecord::from(FormRecord::default());
        Hardener::default().harden(&mut record);

        assert!(record.id.starts_with("form_"));
        assert_eq!(record.id.len(), "form_".len() + 12);
        assert_eq!(record.status, Status::Pending);
        assert_eq!(record.schema_version, "1.0");
        assert_eq!(record.created_at.len(), "2024-01-01T00:00:00".len());
    }

    #[test]
    fn test_harden_is_idempotent() {
        let hardener = Hardener::default();
        let mut record = FeedRecord::from(EmailRecord {
            email_type: EmailType::Invoice,
            ..Default::default()
        });
        hardener.harden(&mut record);
        let once = record.clone();
        hardener.harden(&mut record);
        assert_eq!(record, once);
        assert!(record.needs_action);
    }

    #[test]
    fn test_harden_keeps_existing_metadata() {
        let mut record = FeedRecord::from(InvoiceRecord::default());
        record.id = "invoice_html_000000000001".to_string();
        record.status = Status::Approved;
        record.created_at = "2024-01-01T10:00:00".to_string();
        record.schema_version = "0.9".to_string();

        Hardener::default().harden(&mut record);
        assert_eq!(record.id, "invoice_html_000000000001");
        assert_eq!(record.status, Status::Approved);
        assert_eq!(record.created_at, "2024-01-01T10:00:00");
        assert_eq!(record.schema_version, "0.9");
    }

    #[test]
    fn test_needs_action_recomputed_for_emails() {
        let mut record = FeedRecord::from(EmailRecord {
            email_type: EmailType::Invoice,
            has_pdf_attachments: true,
            matched_invoice_html: true,
            ..Default::default()
        });
        record.needs_action = true;
        Hardener::default().harden(&mut record);
        assert!(!record.needs_action);
    }

    #[test]
    fn test_form_extras_under_reserved_names_are_renamed() {
        let mut form = FormRecord::default();
        form.extra.insert("status".to_string(), json!("approved"));
        let mut record = FeedRecord::from(form);

        Hardener::default().harden(&mut record);

        let Payload::Form(form) = &record.payload else {
            panic!("expected a form record");
        };
        assert!(!form.extra.contains_key("status"));
        assert_eq!(form.extra["form_status"], json!("approved"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn test_stable_ids_are_reproducible() {
        let invoice = InvoiceRecord {
            invoice_number: "INV-1".to_string(),
            source_file: "a.html".to_string(),
            ..Default::default()
        };
        let payload = Payload::Invoice(invoice.clone());
        let first = mint_id(&payload, IdStrategy::Stable);
        let second = mint_id(&payload, IdStrategy::Stable);
        assert_eq!(first, second);
        assert!(first.starts_with("invoice_html_"));

        let other = Payload::Invoice(InvoiceRecord {
            source_file: "b.html".to_string(),
            ..invoice
        });
        assert_ne!(mint_id(&other, IdStrategy::Stable), first);
        assert_ne!(
            mint_id(&payload, IdStrategy::Random),
            mint_id(&payload, IdStrategy::Random)
        );
    }
}

//! Invoice records extracted from rendered HTML invoices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency used when no symbol is found anywhere in the document.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// A structured invoice.
///
/// Amounts are `None` when neither the markup nor the triangle
/// derivation (`subtotal + vat_amount == total`) could supply them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceRecord {
    /// Invoice identifier as printed; empty if unrecognized.
    pub invoice_number: String,

    /// Issue date as ISO `YYYY-MM-DD`, or empty.
    pub date: String,

    /// Payment method as printed.
    pub payment_method: String,

    /// Three-letter currency code.
    pub currency: String,

    pub subtotal: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    /// VAT percentage, e.g. `24` for 24%.
    pub vat_rate: Option<Decimal>,
    pub total: Option<Decimal>,

    /// Issuer block.
    #[serde(flatten)]
    pub seller: Seller,

    /// Customer block.
    #[serde(flatten)]
    pub buyer: Buyer,

    /// Line items in document order.
    pub items: Vec<LineItem>,

    /// Footer notes in document order.
    pub extra_notes: Vec<Note>,

    /// Path of the source document relative to the invoice directory.
    pub source_file: String,
}

impl Default for InvoiceRecord {
    fn default() -> Self {
        Self {
            invoice_number: String::new(),
            date: String::new(),
            payment_method: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            subtotal: None,
            vat_amount: None,
            vat_rate: None,
            total: None,
            seller: Seller::default(),
            buyer: Buyer::default(),
            items: Vec::new(),
            extra_notes: Vec::new(),
            source_file: String::new(),
        }
    }
}

/// The issuing party, as found in the document header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seller {
    #[serde(rename = "seller_name")]
    pub name: String,
    #[serde(rename = "seller_email")]
    pub email: String,
    #[serde(rename = "seller_phone")]
    pub phone: String,
    #[serde(rename = "seller_vat")]
    pub vat_id: String,
    #[serde(rename = "seller_tax_office")]
    pub tax_office: String,
    #[serde(rename = "seller_address")]
    pub address: String,
}

/// The customer, as found in the right-hand details column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Buyer {
    #[serde(rename = "buyer_name")]
    pub name: String,
    #[serde(rename = "buyer_vat")]
    pub vat_id: String,
    #[serde(rename = "buyer_address")]
    pub address: String,
}

/// A single line of the invoice table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub description: String,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub line_total: Option<Decimal>,
    pub currency: String,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            description: String::new(),
            quantity: None,
            unit_price: None,
            line_total: None,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// A `label: value` pair from the free-text footer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub label: String,
    pub value: String,
}

impl InvoiceRecord {
    /// Check whether the amount triangle holds to two decimals.
    ///
    /// Returns `true` when fewer than all three amounts are known.
    pub fn totals_consistent(&self) -> bool {
        match (self.subtotal, self.vat_amount, self.total) {
            (Some(net), Some(vat), Some(gross)) => (net + vat).round_dp(2) == gross.round_dp(2),
            _ => true,
        }
    }

    /// Natural key used for stable identifiers.
    pub fn natural_key(&self) -> &str {
        &self.invoice_number
    }
}

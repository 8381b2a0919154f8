//! Amount parsing for European- and English-formatted invoices.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse an amount such as "1.234,56 €", "1,234.56" or "-12.5".
///
/// The separator that appears last is the decimal separator when it is a
/// comma; otherwise commas are thousands separators.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    let comma_pos = cleaned.rfind(',');
    let dot_pos = cleaned.rfind('.');
    let normalized = match (comma_pos, dot_pos) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned.replace(',', ""),
    };

    Decimal::from_str(&normalized).ok()
}

/// Currency implied by the first symbol found: € beats $ beats £.
pub fn detect_currency(text: &str) -> Option<&'static str> {
    if text.contains('€') {
        Some("EUR")
    } else if text.contains('$') {
        Some("USD")
    } else if text.contains('£') {
        Some("GBP")
    } else {
        None
    }
}

/// Round to two decimals, half to even.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

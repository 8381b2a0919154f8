//! Summary-table amounts and the subtotal/VAT/total triangle.

use rust_decimal::Decimal;

use super::amounts::{parse_amount, round2};
use super::patterns::{SUBTOTAL_LABEL, TOTAL_LABEL, VAT_INCLUDED, VAT_LABEL, VAT_RATE_IN_LABEL};

/// What a summary row's label says it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryRow {
    Subtotal,
    /// VAT amount, with the rate if the label states one.
    Vat(Option<Decimal>),
    Total,
    Other,
}

/// Dispatch a row label. Subtotal labels are checked before VAT labels so
/// "Net amount (excl. VAT)" stays a subtotal. A total that says VAT is
/// included is still a total.
pub fn classify_row(label: &str) -> SummaryRow {
    if SUBTOTAL_LABEL.is_match(label) {
        SummaryRow::Subtotal
    } else if TOTAL_LABEL.is_match(label) && VAT_INCLUDED.is_match(label) {
        SummaryRow::Total
    } else if VAT_LABEL.is_match(label) {
        let rate = VAT_RATE_IN_LABEL
            .captures(label)
            .and_then(|caps| parse_amount(&caps[1]));
        SummaryRow::Vat(rate)
    } else if TOTAL_LABEL.is_match(label) {
        SummaryRow::Total
    } else {
        SummaryRow::Other
    }
}

/// Amounts collected from the summary table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryAmounts {
    pub subtotal: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub total: Option<Decimal>,
    /// Currency from symbols in the table, if any.
    pub currency: Option<&'static str>,
}

impl SummaryAmounts {
    /// Record one `label | value` row.
    pub fn apply_row(&mut self, label: &str, value: &str) {
        match classify_row(label) {
            SummaryRow::Subtotal => self.subtotal = parse_amount(value),
            SummaryRow::Vat(rate) => {
                if rate.is_some() {
                    self.vat_rate = rate;
                }
                self.vat_amount = parse_amount(value);
            }
            SummaryRow::Total => self.total = parse_amount(value),
            SummaryRow::Other => {}
        }
    }

    /// Fill in whatever the known amounts determine.
    ///
    /// Any two of subtotal, VAT amount and total give the third, all
    /// rounded to two decimals. A stated rate with a subtotal gives the VAT
    /// amount. A derived VAT amount must not be negative.
    pub fn derive_missing(&mut self) {
        if let (Some(net), Some(rate), None) = (self.subtotal, self.vat_rate, self.vat_amount) {
            if self.total.is_none() {
                self.vat_amount = Some(round2(net * rate / Decimal::ONE_HUNDRED));
            }
        }

        match (self.subtotal, self.vat_amount, self.total) {
            (Some(net), Some(vat), None) => self.total = Some(round2(net + vat)),
            (Some(net), None, Some(gross)) => {
                let vat = round2(gross - net);
                if vat >= Decimal::ZERO {
                    self.vat_amount = Some(vat);
                }
            }
            (None, Some(vat), Some(gross)) => self.subtotal = Some(round2(gross - vat)),
            _ => {}
        }

        if let (Some(net), Some(vat), None) = (self.subtotal, self.vat_amount, self.vat_rate) {
            if net > Decimal::ZERO {
                self.vat_rate = Some(round2(vat / net * Decimal::ONE_HUNDRED));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_classify_row() {
        assert_eq!(classify_row("Καθαρή Αξία"), SummaryRow::Subtotal);
        assert_eq!(classify_row("Net amount (excl. VAT)"), SummaryRow::Subtotal);
        assert_eq!(classify_row("ΦΠΑ 24%"), SummaryRow::Vat(Some(dec("24"))));
        assert_eq!(classify_row("VAT"), SummaryRow::Vat(None));
        assert_eq!(classify_row("Σύνολο"), SummaryRow::Total);
        assert_eq!(classify_row("Discount"), SummaryRow::Other);
    }

    #[test]
    fn test_total_including_vat_is_total() {
        assert_eq!(classify_row("Total (incl. VAT)"), SummaryRow::Total);
        assert_eq!(classify_row("Σύνολο με ΦΠΑ"), SummaryRow::Total);
        assert_eq!(classify_row("Σύνολο ΦΠΑ"), SummaryRow::Vat(None));

        let mut amounts = SummaryAmounts::default();
        amounts.apply_row("Καθαρή Αξία", "100,00");
        amounts.apply_row("ΦΠΑ 24%", "24,00");
        amounts.apply_row("Total (incl. VAT)", "124,00");
        assert_eq!(amounts.vat_amount, Some(dec("24.00")));
        assert_eq!(amounts.total, Some(dec("124.00")));
    }

    #[test]
    fn test_total_from_subtotal_and_vat() {
        let mut amounts = SummaryAmounts {
            subtotal: Some(dec("100.00")),
            vat_amount: Some(dec("24.00")),
            ..Default::default()
        };
        amounts.derive_missing();
        assert_eq!(amounts.total, Some(dec("124.00")));
        assert_eq!(amounts.vat_rate, Some(dec("24")));
    }

    #[test]
    fn test_vat_and_total_from_subtotal_and_rate() {
        let mut amounts = SummaryAmounts {
            subtotal: Some(dec("100.00")),
            vat_rate: Some(dec("24")),
            ..Default::default()
        };
        amounts.derive_missing();
        assert_eq!(amounts.vat_amount, Some(dec("24.00")));
        assert_eq!(amounts.total, Some(dec("124.00")));
    }

    #[test]
    fn test_vat_from_total_and_subtotal() {
        let mut amounts = SummaryAmounts {
            subtotal: Some(dec("80.65")),
            total: Some(dec("100.00")),
            ..Default::default()
        };
        amounts.derive_missing();
        assert_eq!(amounts.vat_amount, Some(dec("19.35")));
        assert_eq!(amounts.vat_rate, Some(dec("23.99")));
    }

    #[test]
    fn test_negative_vat_is_not_derived() {
        let mut amounts = SummaryAmounts {
            subtotal: Some(dec("120.00")),
            total: Some(dec("100.00")),
            ..Default::default()
        };
        amounts.derive_missing();
        assert_eq!(amounts.vat_amount, None);
        assert_eq!(amounts.vat_rate, None);
    }

    #[test]
    fn test_subtotal_from_vat_and_total() {
        let mut amounts = SummaryAmounts {
            vat_amount: Some(dec("24.00")),
            total: Some(dec("124.00")),
            ..Default::default()
        };
        amounts.derive_missing();
        assert_eq!(amounts.subtotal, Some(dec("100.00")));
    }

    #[test]
    fn test_apply_row_keeps_stated_rate_without_amount() {
        let mut amounts = SummaryAmounts::default();
        amounts.apply_row("Subtotal", "100,00 €");
        amounts.apply_row("VAT 24%", "");
        amounts.derive_missing();
        assert_eq!(amounts.vat_amount, Some(dec("24.00")));
        assert_eq!(amounts.total, Some(dec("124.00")));
    }
}

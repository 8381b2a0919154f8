//! Invoice-number canonicalization.

/// Uppercase `raw` and drop every character that is not alphanumeric.
///
/// `"inv-001/2024"` and `"INV0012024"` both become `"INV0012024"`.
pub fn normalize_invoice_number(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_invoice_number() {
        assert_eq!(normalize_invoice_number("INV-001/2024"), "INV0012024");
        assert_eq!(normalize_invoice_number("inv0012024"), "INV0012024");
        assert_eq!(normalize_invoice_number(" #ΤΠΥ-0042 "), "ΤΠΥ0042");
        assert_eq!(normalize_invoice_number(""), "");
        assert_eq!(normalize_invoice_number("--/ #"), "");
    }

    #[test]
    fn test_normalize_drops_marks_from_uppercasing() {
        assert_eq!(normalize_invoice_number("ǰ-1"), "J1");
        assert_eq!(normalize_invoice_number("ΐ7"), "Ι7");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["INV-2024-007", "τπυ-0042", "a.b.c 1/2", "ß-12", "", "ǆ9", "ǰ", "ΐ"] {
            let once = normalize_invoice_number(raw);
            assert_eq!(normalize_invoice_number(&once), once, "input {raw:?}");
        }
    }
}

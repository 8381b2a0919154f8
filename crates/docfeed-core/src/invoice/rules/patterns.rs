//! Common regex patterns for invoice extraction (Greek and English labels).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number: "Invoice No. INV-001", "Τιμολόγιο #ΤΠΥ-12", "Αριθμός: 2024/17"
    pub static ref INVOICE_NUMBER_LABELED: Regex = Regex::new(
        r"(?i)(?:τιμολ(?:[οό]γιο|\.)?|invoice)\s*(?:αρ\.|no\.|#|:)?\s*(\p{L}{0,4}[-/]?\d[\w/-]+)"
    ).unwrap();

    pub static ref INVOICE_NUMBER_NUMBERED: Regex = Regex::new(
        r"(?i)(?:αριθμός|αρ\.)\s*:?\s*(\p{L}{0,4}[-/]?\d[\w/-]+)"
    ).unwrap();

    // Invoice reference inside free text (email subjects and bodies)
    pub static ref INVOICE_REFERENCE: Regex = Regex::new(
        r"(?i)(?:invoice|τιμολ(?:[οό]γιο|\.)?|αρ\.?\s*τιμολ(?:ογίου)?)\s*(?:no\.?|#|nr\.?|:)?\s*(\p{L}{0,4}[-/]?\d[\w/-]+)"
    ).unwrap();

    // Dates: DD/MM/YYYY, DD-MM-YY, DD.MM.YYYY or YYYY-MM-DD
    pub static ref DATE_TOKEN: Regex = Regex::new(
        r"\b(?:(?P<d>\d{1,2})[/.-](?P<m>\d{1,2})[/.-](?P<y>\d{4}|\d{2})|(?P<iy>\d{4})[/-](?P<im>\d{1,2})[/-](?P<id>\d{1,2}))\b"
    ).unwrap();

    // Party labels
    pub static ref VAT_ID: Regex = Regex::new(
        r"(?i)(?:ΑΦΜ|Α\.Φ\.Μ\.|VAT\s*(?:ID|No\.?|Number)?)\s*:\s*([A-Za-z0-9]+)"
    ).unwrap();

    pub static ref TAX_OFFICE: Regex = Regex::new(
        r"(?i)(?:ΔΟΥ|Δ\.Ο\.Υ\.|Tax\s*Office)\s*:\s*([^|\n]+)"
    ).unwrap();

    pub static ref PHONE_LABELED: Regex = Regex::new(
        r"(?i)(?:Τηλέφωνο|Τηλ\.?|Phone|Tel\.?)\s*:\s*([0-9+\s-]+)"
    ).unwrap();

    pub static ref EMAIL_LABELED: Regex = Regex::new(
        r"(?i)E-?mail\s*:\s*([^\s|]+)"
    ).unwrap();

    pub static ref PAYMENT_METHOD: Regex = Regex::new(
        r"(?i)(?:Τρόπος\s*Πληρωμής|Payment\s*Method)\s*:\s*([^\n]+)"
    ).unwrap();

    pub static ref CUSTOMER_BANNER: Regex = Regex::new(
        r"(?i)^(?:πελάτης|customer|bill\s*to)\b"
    ).unwrap();

    // Summary table rows
    pub static ref SUMMARY_HINT: Regex = Regex::new(
        r"(?i)καθαρ[ηή]\s*αξ[ιί]α|subtotal|net\s*(?:amount|value)"
    ).unwrap();

    pub static ref SUBTOTAL_LABEL: Regex = Regex::new(
        r"(?i)καθαρ[ηή]\s*αξ[ιί]α|net\s*(?:amount|value)|subtotal|προ\s*φπα"
    ).unwrap();

    pub static ref VAT_LABEL: Regex = Regex::new(
        r"(?i)φπα|vat"
    ).unwrap();

    pub static ref VAT_RATE_IN_LABEL: Regex = Regex::new(
        r"(?i)(?:φπα|vat)\s*\(?\s*(\d{1,2}(?:[.,]\d{1,2})?)\s*%"
    ).unwrap();

    pub static ref TOTAL_LABEL: Regex = Regex::new(
        r"(?i)^(?:τελικό\s*)?σ[υύ]νολο\b|^total\b|grand\s*total|total\s*amount|πληρωτέο"
    ).unwrap();

    pub static ref VAT_INCLUDED: Regex = Regex::new(
        r"(?i)\bincl|συμπ|\bμε\s*φπα|with\s*vat"
    ).unwrap();

    // Footer
    pub static ref NOTE_PAIR: Regex = Regex::new(
        r"^(.+?)\s*[:：]\s*(.+)$"
    ).unwrap();

    pub static ref SMALL_PRINT_STYLE: Regex = Regex::new(
        r"(?i)font-size\s*:\s*12px"
    ).unwrap();
}

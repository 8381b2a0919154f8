//! Keyword tables and regex patterns for email classification and identity.

use lazy_static::lazy_static;
use regex::Regex;

/// Invoice vocabulary (English and Greek stems), matched as lowercase substrings.
pub const INVOICE_KEYWORDS: &[&str] = &[
    "invoice",
    "pro forma",
    "proforma",
    "receipt",
    "bill",
    "billing",
    "payment",
    "paid",
    "unpaid",
    "quotation",
    "quote",
    "purchase order",
    "po#",
    "tax invoice",
    "τιμολ",
    "απόδειξη",
    "παραστατικ",
    "πληρωμ",
    "εξόφληση",
    "λογαριασμ",
];

/// Sender local parts typical of accounting mailboxes.
pub const SENDER_HINTS: &[&str] = &["billing", "accounts", "invoices", "accounting", "finance"];

/// Attachment file-name tokens that suggest an invoice document.
pub const INVOICE_FILENAME_HINTS: &[&str] = &["invoice", "τιμολ", "receipt"];

/// Wording of someone asking for a product or service.
pub const CLIENT_CUES: &[&str] = &[
    "αίτημα",
    "ζητάω",
    "ζητάμε",
    "θέλουμε",
    "ενδιαφέρον",
    "need",
    "request",
    "platform",
    "system",
    "crm",
    "pos",
    "management",
    "proposal",
    "rfp",
];

/// Phrases that open a signature block.
pub const SIGNOFF_CUES: &[&str] = &[
    "best regards",
    "kind regards",
    "regards",
    "thanks",
    "thank you",
    "sincerely",
    "με εκτίμηση",
    "ευχαριστώ",
    "καλή συνέχεια",
    "φιλικά",
    "ευχαριστούμε",
];

/// Signature fragments that are never a company name.
pub const NOISE_TOKENS: &[&str] = &[
    "διεύθυνση",
    "address",
    "θέση",
    "position",
    "role",
    "τηλ",
    "tel",
    "phone",
    "email",
    "www",
    "site",
    "ιστοσελίδα",
    "έδρα",
    "founder",
    "ceo",
    "owner",
    "ιδιοκτήτης",
    "department",
    "τμήμα",
];

/// Contact details that rule a line out as a person's name.
pub const CONTACT_TOKENS: &[&str] = &["tel", "phone", "email", "@", "www", "http"];

/// Free-mail providers whose domain says nothing about the sender's company.
pub const WEBMAIL_DOMAINS: &[&str] = &["mail", "gmail", "yahoo", "hotmail", "outlook", "live"];

lazy_static! {
    // Invoice-number-shaped token: "Invoice #INV-1042", "τιμολόγιο 2024001"
    pub static ref INVOICE_NUMBER_HINT: Regex = Regex::new(
        r"(?i)(?:invoice|τιμολ\w*)[^#\w]{0,10}(?:#\s*)?\p{L}{0,4}-?\d{3,}"
    ).unwrap();

    // Phone-shaped runs: +30 210 1234567, 6912345678, 210-1234567
    pub static ref PHONE_CANDIDATE: Regex = Regex::new(
        r"(?:\+?\d{1,3}[\s.-]?)?(?:\(?\d{2,4}\)?[\s.-]?)?\d{3,4}[\s.-]?\d{3,4}"
    ).unwrap();

    // Attachment mentioned in the body but not delivered
    pub static ref ATTACHMENT_PLACEHOLDER: Regex = Regex::new(
        r"(?i)\[(?:ATTACHMENT|ΣΥΝΗΜΜΕΝΟ)\s*:\s*([^\]\n]+)\]"
    ).unwrap();

    pub static ref COMPANY_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:company|organization|org|firm|agency|business)\s*[:-]\s*(.+)").unwrap(),
        Regex::new(r"(?i)(?:εταιρεία|εταιρία|οργανισμός)\s*[:-]\s*(.+)").unwrap(),
    ];

    // Contact label that ends a company value on the same line
    pub static ref CONTACT_LABEL: Regex = Regex::new(
        r"(?i)(?:email|e-mail|τηλ|tel|phone|mobile|mob|www|site|address)[:\s]"
    ).unwrap();

    pub static ref COMPANY_SEPARATOR: Regex = Regex::new(r"[|·•\-–—,:/]").unwrap();

    pub static ref WORD_SEPARATOR: Regex = Regex::new(r"[\s._-]+").unwrap();

    pub static ref SIGNOFF_PATTERNS: Vec<Regex> = SIGNOFF_CUES
        .iter()
        .map(|cue| Regex::new(&format!("(?i){}", regex::escape(cue))).unwrap())
        .collect();
}

/// Whether `haystack` (already lowercased) contains any of `needles`.
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

//! `.eml` parsing: headers, bodies, attachments.

use std::fs;
use std::path::Path;
use std::time::Instant;

use mailparse::{DispositionType, MailAddr, MailHeaderMap, MailParseError, ParsedMail};
use scraper::Html;
use tracing::debug;

use crate::error::{DocumentError, Result};
use crate::html::{block_lines, compact_ws};
use crate::models::config::ClassifierWeights;
use crate::models::{EmailRecord, ExtractionResult};

use super::classify::{classify, Signals};
use super::identity::{extract_phone, guess_company, guess_person_name};
use super::patterns::ATTACHMENT_PLACEHOLDER;

const DEFAULT_PREVIEW_LEN: usize = 500;

/// Parser for raw RFC 822 messages.
#[derive(Debug, Clone)]
pub struct EmailParser {
    weights: ClassifierWeights,
    preview_len: usize,
}

impl Default for EmailParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Attachments found in the MIME tree and in the body text.
#[derive(Debug, Default)]
struct Attachments {
    has_pdf: bool,
    names: Vec<String>,
    placeholder: bool,
}

impl EmailParser {
    /// Create a parser with the default weights and preview length.
    pub fn new() -> Self {
        Self {
            weights: ClassifierWeights::default(),
            preview_len: DEFAULT_PREVIEW_LEN,
        }
    }

    /// Use a custom classifier weight table.
    pub fn with_weights(mut self, weights: ClassifierWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the number of characters kept in `body_preview`.
    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    /// Parse one message.
    ///
    /// Fails only when the bytes are not a MIME message at all; every
    /// missing header or part yields an empty field.
    pub fn parse(
        &self,
        raw: &[u8],
    ) -> std::result::Result<ExtractionResult<EmailRecord>, MailParseError> {
        let start = Instant::now();
        let mail = mailparse::parse_mail(raw)?;
        let mut warnings = Vec::new();

        let subject = compact_ws(&header_value(&mail, "Subject"));
        let date = header_value(&mail, "Date").trim().to_string();
        let (display_name, from_addr) = parse_from(&header_value(&mail, "From"));
        if from_addr.is_empty() {
            warnings.push("No sender address".to_string());
        }

        let mut parts = Vec::new();
        collect_parts(&mail, &mut parts);

        let (body, body_html) = resolve_bodies(&parts);
        if body.is_empty() {
            warnings.push("Empty body".to_string());
        }

        let attachments = find_attachments(&parts, &body);
        let signals = Signals::collect(&subject, &body, &from_addr, &attachments.names);
        let email_type = classify(&signals, &self.weights);

        let phone = extract_phone(&format!("{subject}\n{body}"));
        let company = guess_company(&display_name, &from_addr, &body);
        let person = guess_person_name(&display_name, &body);
        let full_name = if person.is_empty() { display_name } else { person };

        let record = EmailRecord {
            full_name,
            email: from_addr,
            phone,
            company,
            subject,
            date,
            body_preview: preview(&body, self.preview_len),
            body,
            body_html,
            email_type,
            has_pdf_attachments: attachments.has_pdf,
            missing_attachment: attachments.placeholder && !attachments.has_pdf,
            attachment_names: attachments.names,
            ..Default::default()
        };

        debug!(
            "Classified email {:?} as {} (score {})",
            record.subject,
            record.email_type.as_str(),
            signals.score(&self.weights)
        );

        Ok(ExtractionResult {
            record,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Read and parse one `.eml` file; `source_file` is its file name.
    pub fn parse_file(&self, path: &Path) -> Result<ExtractionResult<EmailRecord>> {
        let raw = fs::read(path).map_err(|source| DocumentError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut result = self.parse(&raw).map_err(|e| DocumentError::Mime {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        result.record.source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(result)
    }
}

fn header_value(mail: &ParsedMail<'_>, name: &str) -> String {
    mail.headers.get_first_value(name).unwrap_or_default()
}

/// Display name (whitespace-compacted) and lowercased address.
fn parse_from(header: &str) -> (String, String) {
    let first = mailparse::addrparse(header)
        .ok()
        .and_then(|list| list.iter().next().cloned());

    match first {
        Some(MailAddr::Single(info)) => (
            compact_ws(info.display_name.as_deref().unwrap_or_default()),
            info.addr.trim().to_lowercase(),
        ),
        Some(MailAddr::Group(group)) => match group.addrs.first() {
            Some(info) => (
                compact_ws(info.display_name.as_deref().unwrap_or_default()),
                info.addr.trim().to_lowercase(),
            ),
            None => (compact_ws(&group.group_name), String::new()),
        },
        None if header.contains('@') => (String::new(), header.trim().to_lowercase()),
        None => (compact_ws(header), String::new()),
    }
}

/// Depth-first list of every part, the message itself first.
fn collect_parts<'a, 'b>(mail: &'b ParsedMail<'a>, out: &mut Vec<&'b ParsedMail<'a>>) {
    out.push(mail);
    for sub in &mail.subparts {
        collect_parts(sub, out);
    }
}

/// Disposition of a part, only when the header is actually present.
fn explicit_disposition(part: &ParsedMail<'_>) -> Option<DispositionType> {
    part.headers.get_first_value("Content-Disposition")?;
    Some(part.get_content_disposition().disposition)
}

/// Plain text from the `text/plain` parts, else from the first `text/html`
/// part; the raw HTML is returned alongside.
fn resolve_bodies(parts: &[&ParsedMail<'_>]) -> (String, String) {
    let mut text_parts = Vec::new();
    let mut html_parts = Vec::new();

    for part in parts.iter().filter(|p| p.subparts.is_empty()) {
        if matches!(explicit_disposition(part), Some(DispositionType::Attachment)) {
            continue;
        }
        let content = part.get_body().unwrap_or_default();
        match part.ctype.mimetype.to_lowercase().as_str() {
            "text/plain" => text_parts.push(content),
            "text/html" => html_parts.push(content),
            _ => {}
        }
    }

    let body_html = html_parts.into_iter().next().unwrap_or_default();
    let body = if !text_parts.is_empty() {
        tidy_lines(&text_parts.join("\n"))
    } else if !body_html.is_empty() {
        let document = Html::parse_document(&body_html);
        block_lines(document.root_element()).join("\n")
    } else {
        String::new()
    };
    (body, body_html)
}

/// Compact whitespace on every line and drop blank lines.
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(compact_ws)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn find_attachments(parts: &[&ParsedMail<'_>], body: &str) -> Attachments {
    let mut attachments = Attachments::default();

    for part in parts {
        if !matches!(
            explicit_disposition(part),
            Some(DispositionType::Attachment | DispositionType::Inline)
        ) {
            continue;
        }
        let disposition = part.get_content_disposition();
        let name = disposition
            .params
            .get("filename")
            .or_else(|| part.ctype.params.get("name"))
            .cloned()
            .unwrap_or_default();
        if part.ctype.mimetype.eq_ignore_ascii_case("application/pdf")
            || name.to_lowercase().ends_with(".pdf")
        {
            attachments.has_pdf = true;
        }
        attachments.names.push(name);
    }

    for caps in ATTACHMENT_PLACEHOLDER.captures_iter(body) {
        attachments.names.push(caps[1].trim().to_string());
        attachments.placeholder = true;
    }
    attachments
}

/// First `len` characters, with an ellipsis when the text is longer.
fn preview(body: &str, len: usize) -> String {
    match body.char_indices().nth(len) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailType;
    use pretty_assertions::assert_eq;

    const INVOICE_EMAIL: &str = "From: TechFlow Billing <billing@techflow.gr>\r\n\
To: accounts@client.gr\r\n\
Subject: Invoice INV-2024-007 due\r\n\
Date: Mon, 22 Jan 2024 10:15:00 +0200\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Dear customer,\r\n\
please find attached invoice INV-2024-007.\r\n\
\r\n\
Best regards,\r\n\
TechFlow Billing Team\r\n\
--XYZ\r\n\
Content-Type: application/pdf; name=\"invoice_2024_007.pdf\"\r\n\
Content-Disposition: attachment; filename=\"invoice_2024_007.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQK\r\n\
--XYZ--\r\n";

    const CLIENT_EMAIL: &str = "From: Maria Papadopoulou <maria@gmail.com>\r\n\
Subject: Question about your platform\r\n\
Date: Tue, 23 Jan 2024 09:00:00 +0200\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Hello,\r\n\
we are interested in your CRM.   Call me at 697 123 4567.\r\n\
\r\n\
Kind regards,\r\n\
Maria\r\n\
Company: Nova Retail\r\n";

    const PLACEHOLDER_EMAIL: &str = "From: shop@example.com\r\n\
Subject: Receipt for March\r\n\
Content-Type: text/plain\r\n\
\r\n\
Here is the receipt.\r\n\
[ATTACHMENT: receipt_march.pdf]\r\n";

    #[test]
    fn test_parse_invoice_email() {
        let result = EmailParser::new().parse(INVOICE_EMAIL.as_bytes()).unwrap();
        let email = result.record;

        assert_eq!(email.email, "billing@techflow.gr");
        assert_eq!(email.full_name, "TechFlow Billing");
        assert_eq!(email.subject, "Invoice INV-2024-007 due");
        assert_eq!(email.date, "Mon, 22 Jan 2024 10:15:00 +0200");
        assert_eq!(email.company, "Techflow");
        assert_eq!(email.email_type, EmailType::Invoice);
        assert!(email.has_pdf_attachments);
        assert!(!email.missing_attachment);
        assert_eq!(email.attachment_names, vec!["invoice_2024_007.pdf".to_string()]);
        assert!(email.body.starts_with("Dear customer,\nplease find attached"));
        assert_eq!(email.body_html, "");
    }

    #[test]
    fn test_parse_client_email() {
        let email = EmailParser::new()
            .parse(CLIENT_EMAIL.as_bytes())
            .unwrap()
            .record;

        assert_eq!(email.email_type, EmailType::Client);
        assert_eq!(email.full_name, "Maria Papadopoulou");
        assert_eq!(email.company, "Nova Retail");
        assert_eq!(email.phone, "6971234567");
        assert!(!email.has_pdf_attachments);
        assert!(email.attachment_names.is_empty());
        assert!(!email.needs_action());
        assert!(email.body.contains("we are interested in your CRM. Call me"));
    }

    #[test]
    fn test_placeholder_marks_missing_attachment() {
        let email = EmailParser::new()
            .parse(PLACEHOLDER_EMAIL.as_bytes())
            .unwrap()
            .record;

        assert!(email.missing_attachment);
        assert!(!email.has_pdf_attachments);
        assert_eq!(email.attachment_names, vec!["receipt_march.pdf".to_string()]);
        assert_eq!(email.email_type, EmailType::Invoice);
        assert!(email.needs_action());
    }

    #[test]
    fn test_html_only_body_is_stripped() {
        let raw = "From: a@b.gr\r\nSubject: Hi\r\nContent-Type: text/html\r\n\r\n<html><body><p>Hello <b>there</b></p><p>Second</p></body></html>\r\n";
        let email = EmailParser::new().parse(raw.as_bytes()).unwrap().record;

        assert_eq!(email.body, "Hello there\nSecond");
        assert!(email.body_html.contains("<p>Hello"));
    }

    #[test]
    fn test_preview_is_bounded() {
        let body = "x".repeat(20);
        assert_eq!(preview(&body, 5), "xxxxx…");
        assert_eq!(preview("short", 5), "short");

        let raw = format!("From: a@b.gr\r\nSubject: Hi\r\n\r\n{}\r\n", "é".repeat(600));
        let email = EmailParser::new()
            .with_preview_len(500)
            .parse(raw.as_bytes())
            .unwrap()
            .record;
        assert_eq!(email.body_preview.chars().count(), 501);
    }

    #[test]
    fn test_missing_headers_default_to_empty() {
        let email = EmailParser::new().parse(b"\r\nJust text\r\n").unwrap().record;
        assert_eq!(email.email, "");
        assert_eq!(email.subject, "");
        assert_eq!(email.email_type, EmailType::Client);
    }

    #[test]
    fn test_parse_file_sets_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msg_001.eml");
        fs::write(&path, INVOICE_EMAIL).unwrap();

        let email = EmailParser::new().parse_file(&path).unwrap().record;
        assert_eq!(email.source_file, "msg_001.eml");

        let missing = EmailParser::new().parse_file(&dir.path().join("nope.eml"));
        assert!(missing.is_err());
    }
}

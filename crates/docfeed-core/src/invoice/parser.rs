//! Structural parser for HTML-rendered invoices.
//!
//! The parser expects the usual layout conventions (`.header`,
//! `.invoice-details` with a two-column flex wrapper, `table.invoice-table`,
//! `div.summary`) but never fails on a missing block; it records a warning
//! and leaves the corresponding fields empty.

use std::fs;
use std::path::Path;
use std::time::Instant;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::{DocumentError, Result};
use crate::html::{
    block_lines, child_elements, compact_ws, has_flex_style, is_within, select_all, select_first,
    text_content,
};
use crate::models::invoice::{Buyer, LineItem, Note, Seller, DEFAULT_CURRENCY};
use crate::models::{ExtractionResult, InvoiceRecord};

use super::rules::{
    detect_currency, find_iso_date, parse_amount, SummaryAmounts, CUSTOMER_BANNER, EMAIL_LABELED,
    INVOICE_NUMBER_LABELED, INVOICE_NUMBER_NUMBERED, NOTE_PAIR, PAYMENT_METHOD, PHONE_LABELED,
    SMALL_PRINT_STYLE, SUMMARY_HINT, TAX_OFFICE, VAT_ID,
};
use super::InvoiceExtractor;

/// Header lines containing any of these are contact or tax metadata.
const SELLER_META_MARKERS: &[&str] = &[
    "αφμ", "δου", "vat", "tax office", "email", "e-mail", "τηλ", "phone", "tel:",
];

/// Label for footer paragraphs that carry no `label: value` shape.
const GENERIC_NOTE_LABEL: &str = "Note";

/// Parser for invoices rendered as HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlInvoiceParser;

impl HtmlInvoiceParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse one invoice document.
    pub fn parse(&self, html: &str) -> ExtractionResult<InvoiceRecord> {
        let start = Instant::now();
        let document = Html::parse_document(html);
        let root = document.root_element();
        let mut warnings = Vec::new();

        let full_text = block_lines(root).join("\n");

        let invoice_number = find_invoice_number(&full_text);
        if invoice_number.is_empty() {
            warnings.push("Could not find invoice number".to_string());
        }

        let seller = match select_first(root, ".header") {
            Some(header) => extract_seller(header),
            None => {
                warnings.push("No header block".to_string());
                Seller::default()
            }
        };

        let columns = select_first(root, ".invoice-details")
            .and_then(details_wrapper)
            .map(|wrapper| child_elements(wrapper, "div"))
            .unwrap_or_default();
        if columns.len() < 2 {
            warnings.push("No two-column details area".to_string());
        }

        let left_text = columns
            .first()
            .map(|left| block_lines(*left).join("\n"))
            .unwrap_or_default();
        let mut date = find_iso_date(&left_text);
        if date.is_empty() {
            date = find_iso_date(&full_text);
        }
        let payment_method = capture(&PAYMENT_METHOD, &left_text);

        let buyer = columns.get(1).map(|right| extract_buyer(*right)).unwrap_or_default();

        let (items, items_currency) = extract_items(root);
        if items.is_empty() {
            warnings.push("Could not extract line items".to_string());
        }

        let summary = match find_summary_table(root) {
            Some(table) => extract_summary(table),
            None => {
                warnings.push("No summary table".to_string());
                SummaryAmounts::default()
            }
        };

        let currency = summary
            .currency
            .or(items_currency)
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string();

        let record = InvoiceRecord {
            invoice_number,
            date,
            payment_method,
            currency,
            subtotal: summary.subtotal,
            vat_amount: summary.vat_amount,
            vat_rate: summary.vat_rate,
            total: summary.total,
            seller,
            buyer,
            items,
            extra_notes: extract_footer_notes(root),
            source_file: String::new(),
        };

        debug!(
            "Extracted invoice {:?} with {} items, {} warnings",
            record.invoice_number,
            record.items.len(),
            warnings.len()
        );

        ExtractionResult {
            record,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Read and parse one invoice file.
    ///
    /// `source_file` is set to the path relative to `root`, using `/`.
    pub fn parse_file(&self, path: &Path, root: &Path) -> Result<ExtractionResult<InvoiceRecord>> {
        let bytes = fs::read(path).map_err(|source| DocumentError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let html = String::from_utf8_lossy(&bytes);

        let mut result = self.parse(&html);
        result.record.source_file = relative_source_name(path, root);
        Ok(result)
    }
}

impl InvoiceExtractor for HtmlInvoiceParser {
    fn extract(&self, html: &str) -> ExtractionResult<InvoiceRecord> {
        self.parse(html)
    }

    fn extract_file(&self, path: &Path, root: &Path) -> Result<InvoiceRecord> {
        self.parse_file(path, root).map(|r| r.record)
    }
}

fn capture(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .map(|caps| compact_ws(&caps[1]))
        .unwrap_or_default()
}

fn find_invoice_number(text: &str) -> String {
    [&*INVOICE_NUMBER_LABELED, &*INVOICE_NUMBER_NUMBERED]
        .into_iter()
        .map(|pattern| capture(pattern, text))
        .find(|number| !number.is_empty())
        .unwrap_or_default()
}

fn is_meta_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    SELLER_META_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn extract_seller(header: ElementRef<'_>) -> Seller {
    let mut lines: Vec<String> = select_all(header, "div")
        .into_iter()
        .map(text_content)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        lines = block_lines(header);
    }

    let name = select_first(header, ".company")
        .map(text_content)
        .or_else(|| lines.first().cloned())
        .unwrap_or_default();

    let address = lines
        .iter()
        .find(|line| **line != name && !is_meta_line(line))
        .cloned()
        .unwrap_or_default();

    let joined = lines.join(" | ");
    Seller {
        email: capture(&EMAIL_LABELED, &joined),
        phone: capture(&PHONE_LABELED, &joined),
        vat_id: capture(&VAT_ID, &joined),
        tax_office: capture(&TAX_OFFICE, &joined),
        name,
        address,
    }
}

/// The flex wrapper of the details area: a direct child first, else any
/// descendant.
fn details_wrapper(details: ElementRef<'_>) -> Option<ElementRef<'_>> {
    child_elements(details, "div")
        .into_iter()
        .find(|div| has_flex_style(*div))
        .or_else(|| {
            select_all(details, "div")
                .into_iter()
                .find(|div| has_flex_style(*div))
        })
}

fn extract_buyer(column: ElementRef<'_>) -> Buyer {
    let mut lines = block_lines(column);

    let banner_rest = lines.first().and_then(|first| {
        CUSTOMER_BANNER.find(first).map(|banner| {
            first[banner.end()..]
                .trim_start()
                .trim_start_matches([':', '：'])
                .trim()
                .to_string()
        })
    });
    match banner_rest {
        Some(rest) if rest.is_empty() => {
            lines.remove(0);
        }
        Some(rest) => lines[0] = rest,
        None => {}
    }

    let vat_id = lines
        .iter()
        .rev()
        .find_map(|line| VAT_ID.captures(line).map(|caps| caps[1].to_string()))
        .unwrap_or_default();

    let address = lines
        .iter()
        .skip(1)
        .take_while(|line| !VAT_ID.is_match(line))
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    Buyer {
        name: lines.first().cloned().unwrap_or_default(),
        vat_id,
        address,
    }
}

fn extract_items(root: ElementRef<'_>) -> (Vec<LineItem>, Option<&'static str>) {
    let Some(table) = select_first(root, "table.invoice-table") else {
        return (Vec::new(), None);
    };
    let body = select_first(table, "tbody").unwrap_or(table);

    let mut items = Vec::new();
    let mut currency = None;
    for row in select_all(body, "tr") {
        let cells = child_elements(row, "td");
        if cells.len() < 4 {
            continue;
        }
        let unit_price = text_content(cells[2]);
        let line_total = text_content(cells[3]);
        if let Some(found) = detect_currency(&format!("{unit_price} {line_total}")) {
            currency = Some(found);
        }

        items.push(LineItem {
            description: text_content(cells[0]),
            quantity: parse_amount(&text_content(cells[1])),
            unit_price: parse_amount(&unit_price),
            line_total: parse_amount(&line_total),
            currency: currency.unwrap_or(DEFAULT_CURRENCY).to_string(),
        });
    }
    (items, currency)
}

fn find_summary_table(root: ElementRef<'_>) -> Option<ElementRef<'_>> {
    select_first(root, "div.summary")
        .and_then(|summary| select_first(summary, "table"))
        .or_else(|| {
            select_all(root, "table")
                .into_iter()
                .find(|table| SUMMARY_HINT.is_match(&text_content(*table)))
        })
}

fn extract_summary(table: ElementRef<'_>) -> SummaryAmounts {
    let mut amounts = SummaryAmounts {
        currency: detect_currency(&text_content(table)),
        ..Default::default()
    };

    for row in select_all(table, "tr") {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .collect();
        if let [label, .., value] = cells.as_slice() {
            amounts.apply_row(&text_content(*label), &text_content(*value));
        }
    }

    amounts.derive_missing();
    amounts
}

/// Where footer paragraphs live: the first div after the summary block,
/// else a small-print div, else the whole document.
fn footer_container(root: ElementRef<'_>) -> ElementRef<'_> {
    let divs = select_all(root, "div");

    if let Some(summary) = select_first(root, "div.summary") {
        let after = divs
            .iter()
            .skip_while(|div| div.id() != summary.id())
            .skip(1)
            .find(|div| !is_within(**div, summary));
        if let Some(div) = after {
            return *div;
        }
    }

    divs.into_iter()
        .find(|div| {
            div.value()
                .attr("style")
                .is_some_and(|style| SMALL_PRINT_STYLE.is_match(style))
        })
        .unwrap_or(root)
}

fn extract_footer_notes(root: ElementRef<'_>) -> Vec<Note> {
    select_all(footer_container(root), "p")
        .into_iter()
        .filter_map(parse_note)
        .collect()
}

fn parse_note(paragraph: ElementRef<'_>) -> Option<Note> {
    let text = text_content(paragraph);
    if text.is_empty() {
        return None;
    }

    if let Some(strong) = select_first(paragraph, "strong, b") {
        let label = text_content(strong)
            .trim_end_matches([':', '：'])
            .trim()
            .to_string();
        let value = text
            .strip_prefix(label.as_str())
            .map(|rest| rest.trim_start().trim_start_matches([':', '：']).trim())
            .unwrap_or(text.as_str())
            .to_string();
        return Some(Note { label, value });
    }

    if let Some(caps) = NOTE_PAIR.captures(&text) {
        return Some(Note {
            label: caps[1].trim().to_string(),
            value: caps[2].trim().to_string(),
        });
    }

    Some(Note {
        label: GENERIC_NOTE_LABEL.to_string(),
        value: text,
    })
}

fn relative_source_name(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        _ => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

//! Form submission extraction.
//!
//! A form page is read through its `name=`-keyed controls; the first
//! control carrying a value wins for each name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use scraper::{ElementRef, Html};
use serde_json::Value;
use tracing::debug;

use crate::error::{DocumentError, Result};
use crate::html::{select_all, select_first, text_content};
use crate::models::{ExtractionResult, FormRecord};

/// Control names mapped onto `FormRecord` fields.
const KNOWN_FIELDS: &[&str] = &[
    "full_name",
    "name",
    "email",
    "phone",
    "company",
    "service",
    "message",
    "submission_date",
    "priority",
];

/// Input types that never carry submitted data.
const IGNORED_INPUT_TYPES: &[&str] = &["submit", "button", "reset", "image"];

/// Parser for HTML form submissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormParser;

impl FormParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, html: &str) -> ExtractionResult<FormRecord> {
        let start = Instant::now();
        let document = Html::parse_document(html);
        let mut values = collect_values(document.root_element());
        let mut warnings = Vec::new();

        let mut take = |name: &str| values.remove(name);

        let full_name = take("full_name").or_else(|| take("name"));
        let mut record = FormRecord {
            full_name,
            email: take("email"),
            phone: take("phone").map(|p| normalize_phone(&p)).filter(|p| !p.is_empty()),
            company: take("company"),
            service: take("service"),
            message: take("message"),
            submission_date: take("submission_date"),
            priority: take("priority"),
            source_file: String::new(),
            extra: BTreeMap::new(),
        };
        // Whatever is left is an extra labelled field.
        for (name, value) in values {
            if !KNOWN_FIELDS.contains(&name.as_str()) {
                record.insert_extra(&name, Value::String(value));
            }
        }

        if record.email.is_none() && record.full_name.is_none() {
            warnings.push("Form has neither a name nor an email".to_string());
        }

        ExtractionResult {
            record,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Read and parse one form file; `source_file` is its file name.
    pub fn parse_file(&self, path: &Path) -> Result<ExtractionResult<FormRecord>> {
        let bytes = fs::read(path).map_err(|source| DocumentError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut result = self.parse(&String::from_utf8_lossy(&bytes));
        result.record.source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Parsed form {}", result.record.source_file);
        Ok(result)
    }
}

/// Keep digits and `+` only.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

fn collect_values(root: ElementRef<'_>) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for control in select_all(root, "input[name], textarea[name], select[name]") {
        let Some(name) = control.value().attr("name") else {
            continue;
        };
        if values.contains_key(name) {
            continue;
        }
        if let Some(value) = control_value(control).filter(|v| !v.is_empty()) {
            values.insert(name.to_string(), value);
        }
    }
    values
}

fn control_value(control: ElementRef<'_>) -> Option<String> {
    let element = control.value();
    match element.name() {
        "textarea" => Some(control.text().collect::<String>().trim().to_string()),
        "select" => {
            let option = select_first(control, "option[selected]")
                .or_else(|| select_first(control, "option"))?;
            let value = option
                .value()
                .attr("value")
                .map(str::to_string)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| text_content(option));
            Some(value.trim().to_string())
        }
        _ => {
            let kind = element.attr("type").unwrap_or("text").to_lowercase();
            if IGNORED_INPUT_TYPES.contains(&kind.as_str()) {
                return None;
            }
            if matches!(kind.as_str(), "radio" | "checkbox") && element.attr("checked").is_none() {
                return None;
            }
            element.attr("value").map(|v| v.trim().to_string())
        }
    }
}

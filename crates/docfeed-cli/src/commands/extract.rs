//! Extract command - parse a single invoice, email or form file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde_json::Value;
use tracing::{debug, info};

use docfeed_core::{
    DocumentError, EmailParser, EmailRecord, FormParser, FormRecord, HtmlInvoiceParser,
    InvoiceRecord,
};

use super::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (.eml, .html or .htm)
    #[arg(required = true)]
    input: PathBuf,

    /// Read HTML input as a form submission instead of an invoice
    #[arg(long)]
    form: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show structures the extractor expected but did not find
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty JSON
    Json,
    /// One header row and one value row
    Csv,
    /// Plain text summary
    Text,
}

/// One extracted record of any kind.
enum Document {
    Invoice(InvoiceRecord),
    Email(EmailRecord),
    Form(FormRecord),
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    info!("Extracting {}", args.input.display());

    let (document, warnings, processing_time_ms) = match extension.as_str() {
        "eml" => {
            let result = EmailParser::new()
                .with_weights(config.classifier.clone())
                .with_preview_len(config.feed.preview_len)
                .parse_file(&args.input)?;
            (Document::Email(result.record), result.warnings, result.processing_time_ms)
        }
        "html" | "htm" if args.form => {
            let result = FormParser::new().parse_file(&args.input)?;
            (Document::Form(result.record), result.warnings, result.processing_time_ms)
        }
        "html" | "htm" => {
            let root = args.input.parent().unwrap_or_else(|| Path::new("."));
            let result = HtmlInvoiceParser::new().parse_file(&args.input, root)?;
            (Document::Invoice(result.record), result.warnings, result.processing_time_ms)
        }
        _ => return Err(DocumentError::UnsupportedType(extension).into()),
    };

    if args.show_warnings && !warnings.is_empty() {
        eprintln!("{}", style("Extraction warnings:").yellow());
        for warning in &warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = match args.format {
        OutputFormat::Json => document.to_json()?,
        OutputFormat::Csv => format_csv(&document.to_value()?)?,
        OutputFormat::Text => document.to_text(),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Extraction took {}ms", processing_time_ms);

    Ok(())
}

impl Document {
    fn to_value(&self) -> serde_json::Result<Value> {
        match self {
            Self::Invoice(record) => serde_json::to_value(record),
            Self::Email(record) => serde_json::to_value(record),
            Self::Form(record) => serde_json::to_value(record),
        }
    }

    fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_value()?)
    }

    fn to_text(&self) -> String {
        match self {
            Self::Invoice(record) => format_invoice_text(record),
            Self::Email(record) => format_email_text(record),
            Self::Form(record) => format_form_text(record),
        }
    }
}

/// Flatten a record into a header row and a value row.
///
/// Nested values (items, notes, attachment names) are written as JSON.
fn format_csv(value: &Value) -> anyhow::Result<String> {
    let Value::Object(fields) = value else {
        anyhow::bail!("Record is not an object");
    };

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(fields.keys())?;
    wtr.write_record(fields.values().map(cell))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_else(|| "-".to_string())
}

fn format_invoice_text(invoice: &InvoiceRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", invoice.invoice_number));
    output.push_str(&format!("Date: {}\n", invoice.date));
    if !invoice.payment_method.is_empty() {
        output.push_str(&format!("Payment: {}\n", invoice.payment_method));
    }
    output.push('\n');

    output.push_str("Seller:\n");
    output.push_str(&format!("  {}\n", invoice.seller.name));
    if !invoice.seller.vat_id.is_empty() {
        output.push_str(&format!("  VAT: {}\n", invoice.seller.vat_id));
    }
    if !invoice.seller.address.is_empty() {
        output.push_str(&format!("  {}\n", invoice.seller.address));
    }
    output.push('\n');

    output.push_str("Buyer:\n");
    output.push_str(&format!("  {}\n", invoice.buyer.name));
    if !invoice.buyer.vat_id.is_empty() {
        output.push_str(&format!("  VAT: {}\n", invoice.buyer.vat_id));
    }
    output.push('\n');

    if !invoice.items.is_empty() {
        output.push_str("Items:\n");
        for item in &invoice.items {
            output.push_str(&format!(
                "  {} x{} = {} {}\n",
                item.description,
                opt(&item.quantity),
                opt(&item.line_total),
                item.currency
            ));
        }
        output.push('\n');
    }

    output.push_str("Summary:\n");
    output.push_str(&format!("  Net:   {} {}\n", opt(&invoice.subtotal), invoice.currency));
    output.push_str(&format!(
        "  VAT:   {} {} ({}%)\n",
        opt(&invoice.vat_amount),
        invoice.currency,
        opt(&invoice.vat_rate)
    ));
    output.push_str(&format!("  Total: {} {}\n", opt(&invoice.total), invoice.currency));

    for note in &invoice.extra_notes {
        output.push_str(&format!("\n{}: {}", note.label, note.value));
    }

    output
}

fn format_email_text(email: &EmailRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("From: {} <{}>\n", email.full_name, email.email));
    output.push_str(&format!("Subject: {}\n", email.subject));
    output.push_str(&format!("Date: {}\n", email.date));
    output.push_str(&format!("Type: {}\n", email.email_type.as_str()));
    if !email.company.is_empty() {
        output.push_str(&format!("Company: {}\n", email.company));
    }
    if !email.phone.is_empty() {
        output.push_str(&format!("Phone: {}\n", email.phone));
    }
    if !email.attachment_names.is_empty() {
        output.push_str(&format!("Attachments: {}\n", email.attachment_names.join(", ")));
    }
    if email.missing_attachment {
        output.push_str("Attachment announced but missing\n");
    }
    output.push('\n');
    output.push_str(&email.body_preview);
    output.push('\n');

    output
}

fn format_form_text(form: &FormRecord) -> String {
    let fields = [
        ("Name", &form.full_name),
        ("Email", &form.email),
        ("Phone", &form.phone),
        ("Company", &form.company),
        ("Service", &form.service),
        ("Priority", &form.priority),
        ("Submitted", &form.submission_date),
        ("Message", &form.message),
    ];

    let mut output = String::new();
    for (label, value) in fields {
        if let Some(value) = value {
            output.push_str(&format!("{}: {}\n", label, value));
        }
    }
    for (key, value) in &form.extra {
        output.push_str(&format!("{}: {}\n", key, cell(value)));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_csv_flattens_nested_values() {
        let value = json!({
            "invoice_number": "INV-1",
            "total": 12.5,
            "vat_rate": null,
            "items": [{ "description": "a, b" }]
        });
        let csv = format_csv(&value).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);

        let cells: std::collections::HashMap<&str, &str> =
            headers.iter().zip(rows[0].iter()).collect();
        assert_eq!(cells["invoice_number"], "INV-1");
        assert_eq!(cells["total"], "12.5");
        assert_eq!(cells["vat_rate"], "");
        assert_eq!(cells["items"], r#"[{"description":"a, b"}]"#);
    }

    #[test]
    fn test_format_form_text_skips_empty_fields() {
        let mut form = FormRecord::default();
        form.full_name = Some("Eleni".to_string());
        form.extra.insert("budget".to_string(), json!("5000"));

        assert_eq!(format_form_text(&form), "Name: Eleni\nbudget: 5000\n");
    }
}

//! Review command - inspect the feed and record review decisions.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use docfeed_core::{FeedRecord, FeedStore, Payload, Source, Status};

use super::load_config;

/// Arguments for the review command.
#[derive(Args)]
pub struct ReviewArgs {
    /// Output directory holding the combined feed
    #[arg(short, long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: ReviewCommand,
}

#[derive(Subcommand)]
enum ReviewCommand {
    /// List records in the combined feed
    List(ListArgs),

    /// Change the review status of one record
    SetStatus {
        /// Record id
        id: String,

        /// New status (pending, approved, rejected, edited)
        #[arg(value_parser = parse_status)]
        status: Status,

        /// Do not snapshot the feed before writing
        #[arg(long)]
        no_backup: bool,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Only records from this source (form, email, invoice_html)
    #[arg(long, value_parser = parse_source)]
    source: Option<Source>,

    /// Only records with this status
    #[arg(long, value_parser = parse_status)]
    status: Option<Status>,

    /// Only records flagged as needing action
    #[arg(long)]
    needs_action: bool,

    /// Print matching records as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ReviewArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = args.out {
        config.paths.output_dir = dir;
    }

    match args.command {
        ReviewCommand::List(list_args) => list(&FeedStore::from_config(&config), &list_args),
        ReviewCommand::SetStatus {
            id,
            status,
            no_backup,
        } => {
            let store = FeedStore::from_config(&config).with_backup(config.feed.backup && !no_backup);
            set_status(&store, &id, status)
        }
    }
}

fn parse_status(s: &str) -> Result<Status, String> {
    Status::parse(s).ok_or_else(|| {
        let allowed: Vec<_> = Status::ALL.iter().map(Status::as_str).collect();
        format!("expected one of {}", allowed.join(", "))
    })
}

fn parse_source(s: &str) -> Result<Source, String> {
    Source::parse(s).ok_or_else(|| {
        let allowed: Vec<_> = Source::ALL.iter().map(Source::as_str).collect();
        format!("expected one of {}", allowed.join(", "))
    })
}

fn list(store: &FeedStore, args: &ListArgs) -> anyhow::Result<()> {
    let records = store.load()?;
    let total = records.len();

    let selected: Vec<&FeedRecord> = records
        .iter()
        .filter(|r| args.source.is_none_or(|source| r.source() == source))
        .filter(|r| args.status.is_none_or(|status| r.status == status))
        .filter(|r| !args.needs_action || r.needs_action)
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    for record in &selected {
        let status = match record.status {
            Status::Pending => style(record.status.as_str()).yellow(),
            Status::Approved => style(record.status.as_str()).green(),
            Status::Rejected => style(record.status.as_str()).red(),
            Status::Edited => style(record.status.as_str()).cyan(),
        };
        let flag = if record.needs_action {
            style("!").red().bold()
        } else {
            style(" ")
        };
        println!(
            "{} {:<24} {:<12} {:<9} {}",
            flag,
            record.id,
            record.source(),
            status,
            describe(record)
        );
    }

    println!();
    println!("{} of {} records", selected.len(), total);

    Ok(())
}

/// One-line label for a record.
fn describe(record: &FeedRecord) -> String {
    match &record.payload {
        Payload::Invoice(invoice) => {
            let total = invoice
                .total
                .map(|t| format!(" {} {}", t, invoice.currency))
                .unwrap_or_default();
            format!("{}{} ({})", invoice.invoice_number, total, invoice.source_file)
        }
        Payload::Email(email) => {
            let matched = if email.matched_via.is_matched() {
                format!(" -> {}", email.matched_invoice_file.as_deref().unwrap_or("?"))
            } else {
                String::new()
            };
            format!("[{}] {}{}", email.email_type.as_str(), email.subject, matched)
        }
        Payload::Form(form) => {
            let name = form.full_name.as_deref().unwrap_or("-");
            match form.company.as_deref() {
                Some(company) => format!("{} / {}", name, company),
                None => name.to_string(),
            }
        }
    }
}

fn set_status(store: &FeedStore, id: &str, status: Status) -> anyhow::Result<()> {
    let record = store.set_status(id, status)?;

    println!(
        "{} {} is now {}",
        style("✓").green(),
        record.id,
        style(record.status).bold()
    );

    Ok(())
}

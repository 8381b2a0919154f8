//! Run command - build the combined feed from all input directories.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::debug;

use docfeed_core::feed::RunReport;
use docfeed_core::{Pipeline, Source};

use super::load_config;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Directory of HTML form submissions
    #[arg(long)]
    forms: Option<PathBuf>,

    /// Directory of .eml messages (searched recursively)
    #[arg(long)]
    emails: Option<PathBuf>,

    /// Directory of HTML invoices (searched recursively)
    #[arg(long)]
    invoices: Option<PathBuf>,

    /// Output directory for the feed, artifacts and backups
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Do not snapshot files before overwriting them
    #[arg(long)]
    no_backup: bool,

    /// Parse and reconcile, but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Only link emails to invoices with identical numbers
    #[arg(long)]
    exact_only: bool,

    /// Minimum fuzzy score (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    cutoff: Option<u8>,

    /// Write a per-document summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,
}

pub fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = args.forms {
        config.paths.forms_dir = dir;
    }
    if let Some(dir) = args.emails {
        config.paths.emails_dir = dir;
    }
    if let Some(dir) = args.invoices {
        config.paths.invoices_dir = dir;
    }
    if let Some(dir) = args.out {
        config.paths.output_dir = dir;
    }
    if args.no_backup {
        config.feed.backup = false;
    }
    if args.exact_only {
        config.matching.fuzzy = false;
    }
    if let Some(cutoff) = args.cutoff {
        config.matching.cutoff = cutoff;
    }

    let pipeline = Pipeline::new(config).with_dry_run(args.dry_run);
    let inputs = pipeline.scan();

    if inputs.is_empty() {
        let paths = &pipeline.config().paths;
        anyhow::bail!(
            "No documents found under {}, {} or {}",
            paths.forms_dir.display(),
            paths.emails_dir.display(),
            paths.invoices_dir.display()
        );
    }

    println!(
        "{} Found {} forms, {} emails, {} invoices",
        style("ℹ").blue(),
        inputs.forms.len(),
        inputs.emails.len(),
        inputs.invoices.len()
    );

    let multi_progress = MultiProgress::new();
    let bar_style = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix:>8} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("=>-");
    let add_bar = |label: &str, len: usize| {
        let bar = multi_progress.add(ProgressBar::new(len as u64));
        bar.set_style(bar_style.clone());
        bar.set_prefix(label.to_string());
        bar
    };
    let forms_pb = add_bar("forms", inputs.forms.len());
    let emails_pb = add_bar("emails", inputs.emails.len());
    let invoices_pb = add_bar("invoices", inputs.invoices.len());

    let bars = (forms_pb.clone(), emails_pb.clone(), invoices_pb.clone());
    let pipeline = pipeline.with_progress(move |source, path| {
        let bar = match source {
            Source::Form => &bars.0,
            Source::Email => &bars.1,
            Source::InvoiceHtml => &bars.2,
        };
        if let Some(name) = path.file_name() {
            bar.set_message(name.to_string_lossy().into_owned());
        }
        bar.inc(1);
    });

    let output = pipeline.run_inputs(inputs)?;

    for bar in [&forms_pb, &emails_pb, &invoices_pb] {
        bar.finish_with_message("done");
    }

    let report = &output.report;

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, report)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    print_report(report);

    if report.dry_run {
        println!(
            "{} Dry run: {} records built, nothing written",
            style("ℹ").blue(),
            report.combined
        );
    } else {
        println!(
            "{} Feed written to {}",
            style("✓").green(),
            pipeline.config().paths.combined_path().display()
        );
    }

    debug!("Total run time: {:?}", start.elapsed());

    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    println!(
        "{} Processed {} documents in {}ms",
        style("✓").green(),
        report.documents.len(),
        report.duration_ms
    );
    for (label, counts) in [
        ("forms", report.forms),
        ("emails", report.emails),
        ("invoices", report.invoices),
    ] {
        println!(
            "   {:<9} {} parsed, {} skipped",
            label,
            style(counts.parsed).green(),
            style(counts.skipped).red()
        );
    }
    println!(
        "   {} records in feed, {} emails matched ({} exact, {} fuzzy)",
        report.combined,
        report.matched(),
        report.matched_exact,
        report.matched_fuzzy
    );
    println!("   invoice total: {}", report.invoice_total);

    let failed: Vec<_> = report.documents.iter().filter(|d| !d.is_ok()).collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Skipped files:").red());
        for doc in failed {
            println!(
                "  - {}: {}",
                doc.path.display(),
                doc.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

fn write_summary(path: &Path, report: &RunReport) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "source", "status", "processing_time_ms", "error"])?;

    for doc in &report.documents {
        let filename = doc
            .path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let status = if doc.is_ok() { "parsed" } else { "skipped" };

        wtr.write_record([
            filename.as_str(),
            doc.source.as_str(),
            status,
            &doc.processing_time_ms.to_string(),
            doc.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

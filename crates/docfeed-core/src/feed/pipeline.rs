//! The batch run: scan, parse, index, enrich, assemble, persist.

use std::path::{Path, PathBuf};
use std::time::Instant;

use glob::{glob_with, MatchOptions, Pattern};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::email::EmailParser;
use crate::error::Result;
use crate::form::FormParser;
use crate::invoice::rules::round2;
use crate::invoice::HtmlInvoiceParser;
use crate::matching::{InvoiceIndex, Matcher};
use crate::models::config::FeedConfig;
use crate::models::{ExtractionResult, FeedRecord, Source};

use super::harden::Hardener;
use super::reconcile::enrich_emails;
use super::store::{write_json, FeedStore};

pub const PARSED_FORMS: &str = "parsed_forms.json";
pub const PARSED_EMAILS: &str = "parsed_emails.json";
pub const PARSED_EMAILS_ENRICHED: &str = "parsed_emails_enriched.json";
pub const PARSED_INVOICES: &str = "parsed_invoices.json";

/// Called once per document after it has been attempted.
pub type ProgressFn = dyn Fn(Source, &Path) + Send + Sync;

/// Files discovered for one run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub forms: Vec<PathBuf>,
    pub emails: Vec<PathBuf>,
    pub invoices: Vec<PathBuf>,
}

impl Inputs {
    pub fn len(&self) -> usize {
        self.forms.len() + self.emails.len() + self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub source: Source,
    pub path: PathBuf,
    pub error: Option<String>,
    pub processing_time_ms: u64,
}

impl DocumentOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Parsed and skipped counts for one document type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocCounts {
    pub parsed: usize,
    pub skipped: usize,
}

impl DocCounts {
    fn from_outcomes(outcomes: &[DocumentOutcome]) -> Self {
        let parsed = outcomes.iter().filter(|o| o.is_ok()).count();
        Self {
            parsed,
            skipped: outcomes.len() - parsed,
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub forms: DocCounts,
    pub emails: DocCounts,
    pub invoices: DocCounts,
    /// Records in the combined feed.
    pub combined: usize,
    pub matched_exact: usize,
    pub matched_fuzzy: usize,
    /// Sum of known invoice totals.
    pub invoice_total: Decimal,
    pub dry_run: bool,
    pub duration_ms: u64,
    /// Per-document results, forms then emails then invoices.
    pub documents: Vec<DocumentOutcome>,
}

impl RunReport {
    pub fn matched(&self) -> usize {
        self.matched_exact + self.matched_fuzzy
    }

    pub fn skipped(&self) -> usize {
        self.forms.skipped + self.emails.skipped + self.invoices.skipped
    }
}

/// Result of a run: the report and the hardened combined feed.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: RunReport,
    pub records: Vec<FeedRecord>,
}

/// A configured batch run over the three input directories.
pub struct Pipeline {
    config: FeedConfig,
    dry_run: bool,
    progress: Option<Box<ProgressFn>>,
}

impl Pipeline {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            dry_run: false,
            progress: None,
        }
    }

    /// Parse and reconcile without writing anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Report each attempted document.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(Source, &Path) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Discover input files in sorted order.
    pub fn scan(&self) -> Inputs {
        let paths = &self.config.paths;
        Inputs {
            forms: scan_dir(&paths.forms_dir, &["*.html", "*.htm"]),
            emails: scan_dir(&paths.emails_dir, &["**/*.eml"]),
            invoices: scan_dir(&paths.invoices_dir, &["**/*.html", "**/*.htm"]),
        }
    }

    /// Scan the configured directories and run.
    pub fn run(&self) -> Result<RunOutput> {
        self.run_inputs(self.scan())
    }

    /// Run over an already discovered set of files.
    pub fn run_inputs(&self, inputs: Inputs) -> Result<RunOutput> {
        let start = Instant::now();
        info!(
            "Processing {} forms, {} emails, {} invoices",
            inputs.forms.len(),
            inputs.emails.len(),
            inputs.invoices.len()
        );

        let form_parser = FormParser::new();
        let (forms, form_docs) =
            self.parse_all(Source::Form, &inputs.forms, |p| form_parser.parse_file(p));

        let email_parser = EmailParser::new()
            .with_weights(self.config.classifier.clone())
            .with_preview_len(self.config.feed.preview_len);
        let (mut emails, email_docs) =
            self.parse_all(Source::Email, &inputs.emails, |p| email_parser.parse_file(p));

        let invoice_parser = HtmlInvoiceParser::new();
        let invoice_root = self.config.paths.invoices_dir.as_path();
        let (invoices, invoice_docs) = self.parse_all(Source::InvoiceHtml, &inputs.invoices, |p| {
            invoice_parser.parse_file(p, invoice_root)
        });

        self.write_artifact(PARSED_FORMS, &forms)?;
        self.write_artifact(PARSED_EMAILS, &emails)?;
        self.write_artifact(PARSED_INVOICES, &invoices)?;

        // Every invoice is indexed before the first email is enriched.
        let matcher = Matcher::from_config(&self.config.matching);
        let stats = {
            let index = InvoiceIndex::build(&invoices);
            debug!("Indexed {} invoice numbers", index.len());
            enrich_emails(&mut emails, &index, &matcher)
        };
        self.write_artifact(PARSED_EMAILS_ENRICHED, &emails)?;

        let invoice_total = round2(invoices.iter().filter_map(|i| i.total).sum::<Decimal>());

        let mut records: Vec<FeedRecord> = forms
            .into_iter()
            .map(FeedRecord::from)
            .chain(emails.into_iter().map(FeedRecord::from))
            .chain(invoices.into_iter().map(FeedRecord::from))
            .collect();

        if self.dry_run {
            Hardener::new(&self.config.feed).harden_all(&mut records);
            info!("Dry run: nothing written");
        } else {
            FeedStore::from_config(&self.config).save(&mut records)?;
        }

        let report = RunReport {
            forms: DocCounts::from_outcomes(&form_docs),
            emails: DocCounts::from_outcomes(&email_docs),
            invoices: DocCounts::from_outcomes(&invoice_docs),
            combined: records.len(),
            matched_exact: stats.exact,
            matched_fuzzy: stats.fuzzy,
            invoice_total,
            dry_run: self.dry_run,
            duration_ms: start.elapsed().as_millis() as u64,
            documents: form_docs
                .into_iter()
                .chain(email_docs)
                .chain(invoice_docs)
                .collect(),
        };

        info!(
            "Forms {} parsed / {} skipped, emails {} / {}, invoices {} / {}; {} combined, {} matched ({} exact, {} fuzzy), invoice total {}",
            report.forms.parsed,
            report.forms.skipped,
            report.emails.parsed,
            report.emails.skipped,
            report.invoices.parsed,
            report.invoices.skipped,
            report.combined,
            report.matched(),
            report.matched_exact,
            report.matched_fuzzy,
            report.invoice_total
        );

        Ok(RunOutput { report, records })
    }

    /// Parse one document type, possibly on the rayon pool.
    ///
    /// Output order follows `paths` either way. Failed documents are
    /// logged and skipped.
    fn parse_all<T, F>(
        &self,
        source: Source,
        paths: &[PathBuf],
        parse: F,
    ) -> (Vec<T>, Vec<DocumentOutcome>)
    where
        T: Send,
        F: Fn(&Path) -> Result<ExtractionResult<T>> + Sync,
    {
        let attempt = |path: &PathBuf| {
            let start = Instant::now();
            let result = parse(path.as_path());
            if let Some(progress) = &self.progress {
                progress(source, path.as_path());
            }
            (result, start.elapsed().as_millis() as u64)
        };

        let results: Vec<_> = if self.config.feed.parallel {
            paths.par_iter().map(attempt).collect()
        } else {
            paths.iter().map(attempt).collect()
        };

        let mut records = Vec::with_capacity(results.len());
        let mut outcomes = Vec::with_capacity(results.len());

        for (path, (result, elapsed)) in paths.iter().zip(results) {
            let error = match result {
                Ok(extraction) => {
                    debug!(
                        "Parsed {} in {}ms",
                        path.display(),
                        extraction.processing_time_ms
                    );
                    for warning in &extraction.warnings {
                        debug!("{}: {}", path.display(), warning);
                    }
                    records.push(extraction.record);
                    None
                }
                Err(e) => {
                    warn!("Skipping {} {}: {}", source, path.display(), e);
                    Some(e.to_string())
                }
            };
            outcomes.push(DocumentOutcome {
                source,
                path: path.clone(),
                error,
                processing_time_ms: elapsed,
            });
        }

        (records, outcomes)
    }

    fn write_artifact<T: Serialize>(&self, name: &str, records: &[T]) -> Result<()> {
        if self.dry_run || !self.config.feed.write_artifacts {
            return Ok(());
        }
        let path = self.config.paths.output_dir.join(name);
        let backup_dir = self.config.paths.backup_dir();
        write_json(
            &path,
            records,
            self.config.feed.backup.then_some(backup_dir.as_path()),
        )?;
        debug!("Wrote {} ({} records)", path.display(), records.len());
        Ok(())
    }
}

/// Files under `dir` matching any of `patterns`, sorted and deduplicated.
fn scan_dir(dir: &Path, patterns: &[&str]) -> Vec<PathBuf> {
    if !dir.is_dir() {
        warn!("Input directory {} not found", dir.display());
        return Vec::new();
    }

    let base = Pattern::escape(&dir.to_string_lossy());
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let full = format!("{base}/{pattern}");
        match glob_with(&full, options) {
            Ok(paths) => files.extend(paths.filter_map(|p| p.ok()).filter(|p| p.is_file())),
            Err(e) => warn!("Bad scan pattern {}: {}", full, e),
        }
    }

    files.sort();
    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<html></html>").unwrap();
    }

    #[test]
    fn test_scan_dir_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.html"));
        touch(&dir.path().join("a.HTM"));
        touch(&dir.path().join("2024/c.html"));
        touch(&dir.path().join("notes.txt"));

        let found = scan_dir(dir.path(), &["**/*.html", "**/*.htm"]);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["2024/c.html", "a.HTM", "b.html"]);
    }

    #[test]
    fn test_scan_dir_top_level_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("form.html"));
        touch(&dir.path().join("nested/other.html"));

        let found = scan_dir(dir.path(), &["*.html"]);
        assert_eq!(found, vec![dir.path().join("form.html")]);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_dir(&dir.path().join("nope"), &["*.html"]).is_empty());
    }

    #[test]
    fn test_empty_run_is_dry() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FeedConfig::default();
        config.paths.output_dir = dir.path().join("out");
        config.paths.forms_dir = dir.path().join("forms");
        config.paths.emails_dir = dir.path().join("emails");
        config.paths.invoices_dir = dir.path().join("invoices");

        let output = Pipeline::new(config).with_dry_run(true).run().unwrap();
        assert_eq!(output.report.combined, 0);
        assert!(output.report.dry_run);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_unreadable_documents_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FeedConfig::default();
        config.paths.invoices_dir = dir.path().to_path_buf();
        let good = dir.path().join("good.html");
        touch(&good);

        let inputs = Inputs {
            emails: vec![dir.path().join("gone.eml")],
            invoices: vec![dir.path().join("gone.html"), good],
            ..Inputs::default()
        };
        let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = seen.clone();

        let output = Pipeline::new(config)
            .with_dry_run(true)
            .with_progress(move |_, _| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            })
            .run_inputs(inputs)
            .unwrap();
        let report = output.report;

        assert_eq!(report.emails, DocCounts { parsed: 0, skipped: 1 });
        assert_eq!(report.invoices, DocCounts { parsed: 1, skipped: 1 });
        assert_eq!(report.combined, 1);
        assert_eq!(report.documents.len(), 3);
        assert!(report.documents[1].error.is_some());
        assert!(report.documents[2].is_ok());
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 3);
    }
}

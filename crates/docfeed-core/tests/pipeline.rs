use std::fs;
use std::path::{Path, PathBuf};

use docfeed_core::models::config::IdStrategy;
use docfeed_core::{EmailType, FeedConfig, FeedStore, MatchedVia, Payload, Pipeline, Source, Status};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

const CONTACT_FORM: &str = r#"<html><body><form>
  <input name="full_name" value="Eleni Georgiou">
  <input name="email" value="eleni@alpha.gr">
  <input name="phone" value="+30 210 555 0101">
  <input name="company" value="Alpha Logistics">
  <textarea name="message">Need a CRM demo.</textarea>
</form></body></html>"#;

const INVOICE_HTML: &str = r#"<html><body>
  <h2>Invoice No. INV-2024-007</h2>
  <div class="summary"><table>
    <tr><td>Total</td><td>€250,00</td></tr>
  </table></div>
</body></html>"#;

const INVOICE_EMAIL: &str = "From: TechFlow Billing <billing@techflow.gr>\r\n\
Subject: Invoice INV-2024-007 due\r\n\
Date: Mon, 22 Jan 2024 10:15:00 +0200\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Please find the invoice attached.\r\n\
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
Hello, we are interested in your CRM.\r\n";

const REMINDER_EMAIL: &str = "From: billing@techflow.gr\r\n\
Subject: Invoice INV-2024-0007 reminder\r\n\
Content-Type: text/plain\r\n\
\r\n\
Reminder about the open invoice.\r\n";

struct Fixture {
    dir: TempDir,
    config: FeedConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        write(&root.join("forms/contact.html"), CONTACT_FORM);
        write(&root.join("emails/a_client.eml"), CLIENT_EMAIL);
        write(&root.join("emails/b_invoice.eml"), INVOICE_EMAIL);
        write(&root.join("invoices/2024/inv-007.html"), INVOICE_HTML);

        let mut config = FeedConfig::default();
        config.paths.forms_dir = root.join("forms");
        config.paths.emails_dir = root.join("emails");
        config.paths.invoices_dir = root.join("invoices");
        config.paths.output_dir = root.join("outputs");
        config.feed.parallel = false;

        Self { dir, config }
    }

    fn out(&self, name: &str) -> PathBuf {
        self.config.paths.output_dir.join(name)
    }

    fn feed_json(&self) -> Vec<Value> {
        let content = fs::read_to_string(self.config.paths.combined_path()).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    fn backups(&self, prefix: &str) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.config.paths.backup_dir()) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix))
            })
            .collect()
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_run_builds_combined_feed() {
    let fixture = Fixture::new();
    let output = Pipeline::new(fixture.config.clone()).run().unwrap();
    let report = &output.report;

    assert_eq!(report.forms.parsed, 1);
    assert_eq!(report.emails.parsed, 2);
    assert_eq!(report.invoices.parsed, 1);
    assert_eq!(report.skipped(), 0);
    assert_eq!(report.combined, 4);
    assert_eq!(report.matched_exact, 1);
    assert_eq!(report.matched_fuzzy, 0);
    assert_eq!(report.invoice_total.to_string(), "250.00");

    let feed = fixture.feed_json();
    let sources: Vec<&str> = feed.iter().map(|r| r["source"].as_str().unwrap()).collect();
    assert_eq!(sources, vec!["form", "email", "email", "invoice_html"]);

    for record in &feed {
        assert!(!record["id"].as_str().unwrap().is_empty());
        assert_eq!(record["status"], "pending");
        assert_eq!(record["schema_version"], "1.0");
        assert!(!record["created_at"].as_str().unwrap().is_empty());
    }

    let client = &feed[1];
    assert_eq!(client["email_type"], "client");
    assert_eq!(client["needs_action"], false);

    let invoice_email = &feed[2];
    assert_eq!(invoice_email["email_type"], "invoice");
    assert_eq!(invoice_email["matched_via"], "exact");
    assert_eq!(invoice_email["matched_invoice_html"], true);
    assert_eq!(invoice_email["matched_invoice_file"], "2024/inv-007.html");
    assert_eq!(invoice_email["matched_invoice_total"], json!(250.0));
    assert_eq!(invoice_email["fuzzy_score"], 100);
    assert_eq!(invoice_email["needs_action"], false);

    assert_eq!(feed[3]["invoice_number"], "INV-2024-007");
    assert_eq!(feed[3]["source_file"], "2024/inv-007.html");
}

#[test]
fn test_run_writes_artifacts() {
    let fixture = Fixture::new();
    Pipeline::new(fixture.config.clone()).run().unwrap();

    for name in [
        "parsed_forms.json",
        "parsed_emails.json",
        "parsed_emails_enriched.json",
        "parsed_invoices.json",
    ] {
        assert!(fixture.out(name).is_file(), "{name} missing");
    }

    let raw: Vec<Value> =
        serde_json::from_str(&fs::read_to_string(fixture.out("parsed_emails.json")).unwrap())
            .unwrap();
    let enriched: Vec<Value> = serde_json::from_str(
        &fs::read_to_string(fixture.out("parsed_emails_enriched.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(raw[1]["matched_via"], "none");
    assert_eq!(enriched[1]["matched_via"], "exact");
}

#[test]
fn test_artifacts_can_be_disabled() {
    let mut fixture = Fixture::new();
    fixture.config.feed.write_artifacts = false;
    Pipeline::new(fixture.config.clone()).run().unwrap();

    assert!(fixture.config.paths.combined_path().is_file());
    assert!(!fixture.out("parsed_forms.json").exists());
}

#[test]
fn test_second_run_backs_up_previous_feed() {
    let fixture = Fixture::new();
    let pipeline = Pipeline::new(fixture.config.clone());

    pipeline.run().unwrap();
    assert!(fixture.backups("combined_feed.json.").is_empty());
    let first = fs::read_to_string(fixture.config.paths.combined_path()).unwrap();

    pipeline.run().unwrap();
    let snapshots = fixture.backups("combined_feed.json.");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(fs::read_to_string(&snapshots[0]).unwrap(), first);
    assert!(!fixture.backups("parsed_invoices.json.").is_empty());
}

#[test]
fn test_no_backup_skips_snapshots() {
    let mut fixture = Fixture::new();
    fixture.config.feed.backup = false;
    let pipeline = Pipeline::new(fixture.config.clone());

    pipeline.run().unwrap();
    pipeline.run().unwrap();

    assert!(!fixture.config.paths.backup_dir().exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let fixture = Fixture::new();
    let output = Pipeline::new(fixture.config.clone())
        .with_dry_run(true)
        .run()
        .unwrap();

    assert!(output.report.dry_run);
    assert_eq!(output.records.len(), 4);
    assert!(output.records.iter().all(|r| !r.id.is_empty()));
    assert!(!fixture.config.paths.output_dir.exists());
}

#[test]
fn test_stable_ids_survive_rebuild() {
    let mut fixture = Fixture::new();
    fixture.config.feed.id_strategy = IdStrategy::Stable;
    let pipeline = Pipeline::new(fixture.config.clone());

    let first: Vec<String> = pipeline
        .run()
        .unwrap()
        .records
        .into_iter()
        .map(|r| r.id)
        .collect();
    let second: Vec<String> = pipeline
        .run()
        .unwrap()
        .records
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(first, second);
    assert!(first[0].starts_with("form_"));
    assert!(first[3].starts_with("invoice_html_"));
}

#[test]
fn test_fuzzy_and_exact_only() {
    let mut fixture = Fixture::new();
    write(&fixture.dir.path().join("emails/c_reminder.eml"), REMINDER_EMAIL);

    let output = Pipeline::new(fixture.config.clone())
        .with_dry_run(true)
        .run()
        .unwrap();
    assert_eq!(output.report.matched_exact, 1);
    assert_eq!(output.report.matched_fuzzy, 1);

    let Payload::Email(reminder) = &output.records[3].payload else {
        panic!("expected the reminder email");
    };
    assert_eq!(reminder.matched_via, MatchedVia::Fuzzy);
    assert_eq!(reminder.fuzzy_score, Some(90));
    assert_eq!(reminder.invoice_number_in_subject.as_deref(), Some("INV-2024-0007"));

    fixture.config.matching.fuzzy = false;
    let output = Pipeline::new(fixture.config.clone())
        .with_dry_run(true)
        .run()
        .unwrap();
    assert_eq!(output.report.matched_fuzzy, 0);

    let Payload::Email(reminder) = &output.records[3].payload else {
        panic!("expected the reminder email");
    };
    assert_eq!(reminder.matched_via, MatchedVia::Unmatched);
    assert_eq!(reminder.fuzzy_score, None);
    assert_eq!(reminder.email_type, EmailType::Invoice);
    assert!(output.records[3].needs_action);
}

#[test]
fn test_review_round_trip_through_store() {
    let fixture = Fixture::new();
    Pipeline::new(fixture.config.clone()).run().unwrap();

    let store = FeedStore::from_config(&fixture.config);
    let records = store.load().unwrap();
    let target = records
        .iter()
        .find(|r| r.source() == Source::InvoiceHtml)
        .unwrap()
        .id
        .clone();

    store.set_status(&target, Status::Approved).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.len(), 4);
    let approved: Vec<_> = reloaded
        .iter()
        .filter(|r| r.status == Status::Approved)
        .collect();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].id, target);
    assert_eq!(fixture.backups("combined_feed.json.").len(), 1);
}

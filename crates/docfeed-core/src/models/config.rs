//! Configuration structures for the feed pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Main configuration for the docfeed pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Input and output locations.
    pub paths: PathsConfig,

    /// Invoice matching configuration.
    pub matching: MatchingConfig,

    /// Email classifier weights.
    pub classifier: ClassifierWeights,

    /// Feed assembly and persistence configuration.
    pub feed: FeedOptions,
}

/// Input directories and the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory of HTML form submissions.
    pub forms_dir: PathBuf,

    /// Directory of `.eml` messages (searched recursively).
    pub emails_dir: PathBuf,

    /// Directory of HTML invoices (searched recursively).
    pub invoices_dir: PathBuf,

    /// Directory receiving the combined feed, artifacts and backups.
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            forms_dir: PathBuf::from("dummy_data/forms"),
            emails_dir: PathBuf::from("dummy_data/emails"),
            invoices_dir: PathBuf::from("dummy_data/invoices"),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl PathsConfig {
    /// Canonical feed location.
    pub fn combined_path(&self) -> PathBuf {
        self.output_dir.join("combined_feed.json")
    }

    /// Where whole-file snapshots go before each write.
    pub fn backup_dir(&self) -> PathBuf {
        self.output_dir.join("_backups")
    }
}

/// Similarity measure used for the fuzzy path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// Best windowed edit-distance similarity.
    #[default]
    PartialRatio,
    /// 80 when one key contains the other, else 0.
    Containment,
}

/// Invoice matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Fall back to fuzzy matching when there is no exact key.
    pub fuzzy: bool,

    /// Minimum score (0-100) for a fuzzy match to count.
    pub cutoff: u8,

    /// Similarity measure for the fuzzy path.
    pub scorer: ScorerKind,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy: true,
            cutoff: 85,
            scorer: ScorerKind::PartialRatio,
        }
    }
}

/// Additive weights of the email classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierWeights {
    pub subject_keyword: i32,
    pub body_keyword: i32,
    pub invoice_number_in_subject: i32,
    pub sender_hint: i32,
    pub pdf_attachment: i32,
    pub invoice_filename: i32,
    pub client_cue_subject: i32,
    pub client_cue_body: i32,
    /// Minimum score for `invoice`.
    pub threshold: i32,
}

impl Default for ClassifierWeights {
    fn default() -> Self {
        Self {
            subject_keyword: 4,
            body_keyword: 1,
            invoice_number_in_subject: 2,
            sender_hint: 2,
            pdf_attachment: 3,
            invoice_filename: 3,
            client_cue_subject: -2,
            client_cue_body: -1,
            threshold: 4,
        }
    }
}

/// How record ids are minted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// `<source>_<12 random hex>`.
    #[default]
    Random,
    /// `<source>_<12 hex of sha256(source|source_file|natural key)>`.
    Stable,
}

/// Feed assembly and persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedOptions {
    /// Snapshot the previous file before every write.
    pub backup: bool,

    /// Also write the per-type `parsed_*.json` files.
    pub write_artifacts: bool,

    /// Schema version stamped on new records.
    pub schema_version: String,

    /// Characters kept in `body_preview`.
    pub preview_len: usize,

    /// Id minting strategy.
    pub id_strategy: IdStrategy,

    /// Parse documents of one type on the rayon pool.
    pub parallel: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            backup: true,
            write_artifacts: true,
            schema_version: "1.0".to_string(),
            preview_len: 500,
            id_strategy: IdStrategy::Random,
            parallel: true,
        }
    }
}

impl FeedConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

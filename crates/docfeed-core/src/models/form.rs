//! Form submission records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Keys owned by the feed record or by `FormRecord` itself. Extra fields
/// with these names would be written next to them and shadow them on load.
pub const RESERVED_KEYS: &[&str] = &[
    "id",
    "status",
    "source",
    "created_at",
    "schema_version",
    "needs_action",
    "source_file",
];

/// Prefix given to an extra field whose name is reserved.
pub const RESERVED_PREFIX: &str = "form_";

/// A flat set of labelled fields from an HTML form submission.
///
/// Fields this crate does not know about are kept in `extra` and written
/// back, with reserved names moved under `form_`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormRecord {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
    pub submission_date: Option<String>,
    pub priority: Option<String>,
    pub source_file: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FormRecord {
    /// Add an extra field, renaming a reserved name to `form_<name>`.
    /// The first value stored under a key wins.
    pub fn insert_extra(&mut self, name: &str, value: serde_json::Value) {
        let key = if RESERVED_KEYS.contains(&name) {
            format!("{RESERVED_PREFIX}{name}")
        } else {
            name.to_string()
        };
        self.extra.entry(key).or_insert(value);
    }

    /// Move any extra field under a reserved name to its prefixed key.
    pub fn rename_reserved_extras(&mut self) {
        for name in RESERVED_KEYS {
            if let Some(value) = self.extra.remove(*name) {
                self.insert_extra(name, value);
            }
        }
    }

    /// Natural key used for stable identifiers.
    pub fn natural_key(&self) -> String {
        format!(
            "{}|{}",
            self.email.as_deref().unwrap_or_default(),
            self.submission_date.as_deref().unwrap_or_default()
        )
    }
}

//! Display text lookup for properties and categories.
//!
//! The table is loaded once at startup and handed to the data model by
//! reference; nothing in the core mutates it afterwards.

use std::{collections::HashMap, fs, path::Path, sync::Arc};

use serde::Deserialize;

use crate::{
    error::{ConfigError, Result},
    schema::parse_by_extension,
};

/// Title and description shown for one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyText {
    /// Short display name.
    pub title: String,
    /// Longer help text.
    #[serde(default)]
    pub description: String,
}

/// Read-only source of display text keyed by property field or category key.
pub trait TextLookup {
    /// Returns the text for `key`, if the table knows it.
    fn lookup(&self, key: &str) -> Option<&PropertyText>;

    /// Like [`TextLookup::lookup`], falling back to the key itself as title.
    fn lookup_or_key(&self, key: &str) -> PropertyText {
        self.lookup(key).cloned().unwrap_or_else(|| PropertyText {
            title: key.to_string(),
            description: String::new(),
        })
    }
}

/// Shared handle to the process-wide text table.
pub type SharedText = Arc<dyn TextLookup + Send + Sync>;

/// Language table loaded from a TOML or JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable {
    entries: HashMap<String, PropertyText>,
}

impl LanguageTable {
    /// Loads a table, picking the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::from_io(path, e))?;
        let table: LanguageTable = parse_by_extension(path, &content)?;
        debug!(
            "loaded {} language entries from {}",
            table.entries.len(),
            path.display()
        );
        Ok(table)
    }

    /// Builds a table from `(key, title, description)` triples.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, title, description)| {
                    (
                        key.to_string(),
                        PropertyText {
                            title: title.to_string(),
                            description: description.to_string(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Number of known keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TextLookup for LanguageTable {
    fn lookup(&self, key: &str) -> Option<&PropertyText> {
        self.entries.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_falls_back_to_key() {
        let table = LanguageTable::from_entries([("enable_braid", "Braid", "Lara's braid.")]);
        assert_eq!(table.lookup_or_key("enable_braid").title, "Braid");

        let missing = table.lookup_or_key("fov_value");
        assert_eq!(missing.title, "fov_value");
        assert!(missing.description.is_empty());
    }

    #[test]
    fn test_load_toml_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en.toml");
        fs::write(
            &path,
            r#"
[brightness]
title = "Brightness"
description = "Overall scene brightness."

[fov_value]
title = "Field of view"
"#,
        )
        .unwrap();

        let table = LanguageTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("fov_value").unwrap().description, "");
    }
}

//! CSL-JSON bibliography
//!
//! Reads the array format exported by Zotero and most reference managers.
//! Only `id` is required; `title`, `author`, `issued` and `URL` are picked up
//! when present. Keys are matched case-insensitively.

use crate::error::{EnrichmentError, EnrichmentResult};
use garden_core::{BibEntry, Bibliography};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct CslItem {
    id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Vec<CslName>,
    #[serde(default)]
    issued: Option<CslDate>,
    #[serde(default, rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CslName {
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    literal: Option<String>,
}

impl CslName {
    fn display(&self) -> Option<String> {
        if let Some(literal) = &self.literal {
            return Some(literal.clone());
        }
        match (&self.given, &self.family) {
            (Some(given), Some(family)) => Some(format!("{given} {family}")),
            (None, Some(name)) | (Some(name), None) => Some(name.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CslDate {
    #[serde(default, rename = "date-parts")]
    date_parts: Vec<Vec<Value>>,
}

impl CslDate {
    fn year(&self) -> Option<i32> {
        let first = self.date_parts.first()?.first()?;
        match first {
            Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// [`Bibliography`] loaded from a CSL-JSON file
#[derive(Debug, Clone, Default)]
pub struct CslBibliography {
    entries: HashMap<String, BibEntry>,
}

impl CslBibliography {
    /// Empty bibliography
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a CSL-JSON array from `path`
    pub async fn load(path: &Path) -> EnrichmentResult<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| EnrichmentError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        let bibliography =
            Self::from_json_str(&content).map_err(|source| EnrichmentError::Bibliography {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            path = %path.display(),
            entries = bibliography.len(),
            "Loaded bibliography"
        );
        Ok(bibliography)
    }

    /// Parse a CSL-JSON array; entries without a usable `id` are skipped
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<Value> = serde_json::from_str(content)?;
        let mut entries = HashMap::with_capacity(raw.len());

        for (position, value) in raw.into_iter().enumerate() {
            let item: CslItem = match serde_json::from_value(value) {
                Ok(item) => item,
                Err(e) => {
                    warn!(position, error = %e, "Skipping malformed bibliography entry");
                    continue;
                }
            };
            let key = match &item.id {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
                Value::Number(n) => n.to_string(),
                _ => {
                    warn!(position, "Skipping bibliography entry without an id");
                    continue;
                }
            };

            let entry = BibEntry {
                title: item.title.clone().unwrap_or_else(|| key.clone()),
                authors: item.author.iter().filter_map(CslName::display).collect(),
                year: item.issued.as_ref().and_then(CslDate::year),
                url: item.url.clone(),
                key: key.clone(),
            };
            entries.insert(key, entry);
        }

        Ok(Self { entries })
    }
}

impl Bibliography for CslBibliography {
    fn lookup(&self, key: &str) -> Option<BibEntry> {
        self.entries.get(&key.to_lowercase()).cloned()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

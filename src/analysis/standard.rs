use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::aggregations::Principle;

/// Read-only reference standard: WCAG criterion id to POUR principle.
#[derive(Debug, Clone, Default)]
pub struct Standard {
    pub standard_id: Option<String>,
    pub wcag_version: Option<String>,
    criteria: HashMap<String, Criterion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Criterion {
    #[serde(default)]
    pub principle: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StandardDocument {
    #[serde(default)]
    standard_id: Option<String>,
    #[serde(default)]
    wcag_version: Option<String>,
    #[serde(default)]
    criteria: Option<HashMap<String, Criterion>>,
}

impl Standard {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read standard {}", path.display()))?;
        let standard = Self::from_json_slice(&raw)
            .with_context(|| format!("invalid standard {}", path.display()))?;

        info!(
            path = %path.display(),
            standard_id = %standard.standard_id.as_deref().unwrap_or_default(),
            wcag_version = %standard.wcag_version.as_deref().unwrap_or_default(),
            criteria = standard.criteria.len(),
            "loaded reference standard"
        );

        Ok(standard)
    }

    pub fn from_json_slice(raw: &[u8]) -> Result<Self> {
        let pattern =
            Regex::new(r"^\d+\.\d+\.\d+$").context("failed to compile criterion id regex")?;

        let document: StandardDocument =
            serde_json::from_slice(raw).context("failed to parse standard json")?;
        let Some(criteria) = document.criteria else {
            bail!("standard has no `criteria` table");
        };

        let mut accepted = HashMap::with_capacity(criteria.len());
        for (id, criterion) in criteria {
            if !pattern.is_match(&id) {
                warn!(criterion_id = %id, "ignoring criterion with malformed id");
                continue;
            }
            accepted.insert(id, criterion);
        }

        if accepted.is_empty() {
            bail!("standard defines no WCAG criteria");
        }

        Ok(Self {
            standard_id: document.standard_id,
            wcag_version: document.wcag_version,
            criteria: accepted,
        })
    }

    /// Builds a standard from `(criterion id, principle)` pairs.
    #[cfg(test)]
    pub fn from_principles<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let criteria = entries
            .into_iter()
            .map(|(id, principle)| {
                (
                    id.to_string(),
                    Criterion {
                        principle: Some(principle.to_string()),
                        extra: Map::new(),
                    },
                )
            })
            .collect();

        Self {
            criteria,
            ..Self::default()
        }
    }

    pub fn criterion(&self, id: &str) -> Option<&Criterion> {
        self.criteria.get(id)
    }

    /// Principle of a criterion; `None` when the criterion is unknown or its
    /// principle is not one of the four POUR values.
    pub fn principle_of(&self, id: &str) -> Option<Principle> {
        self.criterion(id)?
            .principle
            .as_deref()
            .and_then(Principle::parse)
    }
}

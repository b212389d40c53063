use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::analysis::SkipTally;
use crate::util::parse_timestamp;

/// One audit execution against one site, as persisted by the audit runner.
///
/// Only the presence of `schemaVersion`, `auditRun` and `results` is checked
/// at admission. Every other field is read leniently: a value of the wrong
/// type reads as absent instead of rejecting the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRun {
    pub schema_version: Value,
    #[serde(deserialize_with = "lenient_or_default")]
    pub audit_run: RunInfo,
    #[serde(default)]
    pub environment: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub standard: Option<StandardRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub scope: Option<AuditScope>,
    #[serde(deserialize_with = "lenient_or_default")]
    pub results: RunResults,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    #[serde(default, deserialize_with = "lenient_id")]
    pub audit_run_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub site_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub started_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardRef {
    #[serde(default, deserialize_with = "lenient")]
    pub standard_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub wcag_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditScope {
    #[serde(default, deserialize_with = "lenient_id")]
    pub site_id: Option<String>,
    #[serde(default)]
    pub pages: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResults {
    #[serde(default)]
    pub raw_findings: Option<Value>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub normalised_findings: NormalisedFindings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalisedFindings {
    #[serde(default, deserialize_with = "finding_list")]
    pub compliance: Vec<NormalisedFinding>,
    #[serde(default, deserialize_with = "finding_list")]
    pub other: Vec<NormalisedFinding>,
}

/// A finding already classified as WCAG compliance or "other" advisory.
///
/// `occurrenceCount` is kept as raw JSON because its consumers disagree on
/// how a missing or non-numeric value is counted; see
/// [`NormalisedFinding::violation_weight`] and
/// [`NormalisedFinding::summary_weight`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalisedFinding {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub wcag_criterion_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_count: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_id")]
    pub rule_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryEntry {
    pub path: String,
    pub site_id: Option<String>,
    pub audit_run_id: Option<String>,
    pub started_at: Option<String>,
    pub compliance_findings: usize,
    pub other_findings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub mode: String,
    pub run_count: usize,
    pub runs: Vec<InventoryEntry>,
    pub skipped: SkipTally,
}

impl AuditRun {
    /// `scope.siteId`, falling back to `auditRun.siteId`. Empty ids count as absent.
    pub fn site_id(&self) -> Option<&str> {
        self.scope
            .as_ref()
            .and_then(|scope| non_empty(scope.site_id.as_deref()))
            .or_else(|| non_empty(self.audit_run.site_id.as_deref()))
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.audit_run
            .started_at
            .as_deref()
            .and_then(parse_timestamp)
    }

    pub fn findings(&self) -> &NormalisedFindings {
        &self.results.normalised_findings
    }
}

impl NormalisedFinding {
    /// Count used by the standard-backed reducers: absent, zero or
    /// non-numeric counts weigh one occurrence.
    pub fn violation_weight(&self) -> u64 {
        match self.numeric_count() {
            Some(count) if count > 0 => count,
            _ => 1,
        }
    }

    /// Count used by per-site summaries: absent or non-numeric counts weigh zero.
    pub fn summary_weight(&self) -> u64 {
        self.numeric_count().unwrap_or(0)
    }

    fn numeric_count(&self) -> Option<u64> {
        let value = self.occurrence_count.as_ref()?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|count| count.is_finite() && *count >= 0.0 && count.fract() == 0.0)
                .map(|count| count as u64)
        })
    }
}

/// WCAG guideline id of a criterion id: its first two dot-separated parts.
pub fn guideline_id(criterion_id: &str) -> String {
    criterion_id.split('.').take(2).collect::<Vec<_>>().join(".")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// Reads `T`, or `None` when the value is null or of another type.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Identifiers may be written as strings or numbers.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// A non-array list reads as empty; entries that are not objects read as
/// findings with no fields.
fn finding_list<'de, D>(deserializer: D) -> Result<Vec<NormalisedFinding>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).unwrap_or_default())
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn finding(count: Value) -> NormalisedFinding {
        serde_json::from_value(json!({ "wcagCriterionId": "1.4.3", "occurrenceCount": count }))
            .expect("finding should deserialize")
    }

    #[test]
    fn violation_weight_defaults_to_one_for_missing_or_falsy_counts() {
        let missing: NormalisedFinding =
            serde_json::from_value(json!({ "wcagCriterionId": "1.4.3" })).expect("finding");
        assert_eq!(missing.violation_weight(), 1);
        assert_eq!(finding(json!(0)).violation_weight(), 1);
        assert_eq!(finding(Value::Null).violation_weight(), 1);
        assert_eq!(finding(json!("many")).violation_weight(), 1);
        assert_eq!(finding(json!(4)).violation_weight(), 4);
        assert_eq!(finding(json!(3.0)).violation_weight(), 3);
    }

    #[test]
    fn negative_or_fractional_counts_are_not_occurrence_counts() {
        assert_eq!(finding(json!(-2)).violation_weight(), 1);
        assert_eq!(finding(json!(2.5)).violation_weight(), 1);
        assert_eq!(finding(json!(-2)).summary_weight(), 0);
        assert_eq!(finding(json!(2.5)).summary_weight(), 0);
    }

    #[test]
    fn finding_lists_tolerate_malformed_entries() {
        let findings: NormalisedFindings = serde_json::from_value(json!({
            "compliance": [7, { "wcagCriterionId": 1.1, "occurrenceCount": 3 }],
            "other": { "ruleId": "region" }
        }))
        .expect("findings should deserialize");

        assert_eq!(findings.compliance.len(), 2);
        assert!(findings.compliance[0].wcag_criterion_id.is_none());
        assert!(findings.compliance[1].wcag_criterion_id.is_none());
        assert_eq!(findings.compliance[1].summary_weight(), 3);
        assert!(findings.other.is_empty());
    }

    #[test]
    fn summary_weight_defaults_to_zero_for_missing_or_non_numeric_counts() {
        let missing: NormalisedFinding =
            serde_json::from_value(json!({ "ruleId": "region" })).expect("finding");
        assert_eq!(missing.summary_weight(), 0);
        assert_eq!(finding(json!("7")).summary_weight(), 0);
        assert_eq!(finding(json!(-2)).summary_weight(), 0);
        assert_eq!(finding(json!(7)).summary_weight(), 7);
    }

    #[test]
    fn guideline_id_keeps_first_two_components() {
        assert_eq!(guideline_id("1.4.3"), "1.4");
        assert_eq!(guideline_id("4.1.2"), "4.1");
        assert_eq!(guideline_id("2.4.10"), "2.4");
    }

    #[test]
    fn site_id_prefers_scope_and_ignores_empty_values() {
        let run: AuditRun = serde_json::from_value(json!({
            "schemaVersion": "1.0",
            "auditRun": { "siteId": "from-run" },
            "scope": { "siteId": "" },
            "results": {}
        }))
        .expect("audit run should deserialize");
        assert_eq!(run.site_id(), Some("from-run"));

        let run: AuditRun = serde_json::from_value(json!({
            "schemaVersion": "1.0",
            "auditRun": { "siteId": "from-run" },
            "scope": { "siteId": "from-scope" },
            "results": { "normalisedFindings": null }
        }))
        .expect("audit run should deserialize");
        assert_eq!(run.site_id(), Some("from-scope"));
        assert!(run.findings().compliance.is_empty());
    }

    #[test]
    fn passthrough_fields_are_preserved_on_findings() {
        let finding: NormalisedFinding = serde_json::from_value(json!({
            "wcagCriterionId": "1.1.1",
            "impact": "serious",
            "nodes": ["img"]
        }))
        .expect("finding should deserialize");
        assert_eq!(finding.extra.get("impact"), Some(&json!("serious")));
    }
}

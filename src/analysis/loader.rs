use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::Value;

use super::observer::{SkipObserver, SkipReason};
use super::walker::FileTreeWalker;
use crate::model::AuditRun;

const REQUIRED_FIELDS: [&str; 3] = ["schemaVersion", "auditRun", "results"];

/// An admitted audit run together with the file it was read from.
#[derive(Debug, Clone)]
pub struct LoadedRun {
    pub path: PathBuf,
    pub run: AuditRun,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Admitted(Box<LoadedRun>),
    Skipped { path: PathBuf, reason: SkipReason },
}

/// Lazily turns the JSON files of a walk into audit-run outcomes.
///
/// Non-JSON paths are dropped without an outcome. Walk failures surface as
/// `Err` items; per-file failures become [`LoadOutcome::Skipped`].
#[derive(Debug)]
pub struct AuditRunLoader {
    files: FileTreeWalker,
}

impl AuditRunLoader {
    pub fn new(files: FileTreeWalker) -> Self {
        Self { files }
    }

    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(FileTreeWalker::new(root)?))
    }

    pub fn root(&self) -> &Path {
        self.files.root()
    }

    /// Yields only admitted runs, reporting every skip to `observer`.
    pub fn admitted(self, observer: &dyn SkipObserver) -> AdmittedRuns<'_> {
        AdmittedRuns {
            outcomes: self,
            observer,
        }
    }
}

impl Iterator for AuditRunLoader {
    type Item = Result<LoadOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = match self.files.next()? {
                Ok(path) => path,
                Err(err) => return Some(Err(err)),
            };

            if !is_json_path(&path) {
                continue;
            }

            return Some(Ok(load_file(path)));
        }
    }
}

pub struct AdmittedRuns<'a> {
    outcomes: AuditRunLoader,
    observer: &'a dyn SkipObserver,
}

impl Iterator for AdmittedRuns<'_> {
    type Item = Result<LoadedRun>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.outcomes.next()? {
                Ok(LoadOutcome::Admitted(loaded)) => return Some(Ok(*loaded)),
                Ok(LoadOutcome::Skipped { path, reason }) => self.observer.on_skip(&path, &reason),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

pub fn load_file(path: PathBuf) -> LoadOutcome {
    let admitted = fs::read(&path)
        .map_err(SkipReason::Read)
        .and_then(|raw| admit(&raw));

    match admitted {
        Ok(run) => LoadOutcome::Admitted(Box::new(LoadedRun { path, run })),
        Err(reason) => LoadOutcome::Skipped { path, reason },
    }
}

/// Parses and structurally validates one audit-run document.
pub fn admit(raw: &[u8]) -> Result<AuditRun, SkipReason> {
    let document: Value = serde_json::from_slice(raw).map_err(SkipReason::Parse)?;

    let Some(fields) = document.as_object() else {
        return Err(SkipReason::NotAnObject);
    };

    for field in REQUIRED_FIELDS {
        if !is_present(fields.get(field)) {
            return Err(SkipReason::MissingField(field));
        }
    }

    serde_json::from_value(document).map_err(SkipReason::Shape)
}

fn is_json_path(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(".json"))
        .unwrap_or(false)
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Bool(true)) | Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_accepts_minimal_audit_run() {
        let raw = br#"{
            "schemaVersion": "1.0",
            "auditRun": { "auditRunId": "run-1", "startedAt": "2024-01-01T12:00:00Z" },
            "scope": { "siteId": "site-a" },
            "results": { "normalisedFindings": { "compliance": [{ "wcagCriterionId": "1.1.1" }], "other": [] } }
        }"#;

        let run = admit(raw).expect("audit run should be admitted");
        assert_eq!(run.audit_run.audit_run_id.as_deref(), Some("run-1"));
        assert_eq!(run.findings().compliance.len(), 1);
    }

    #[test]
    fn admit_reports_first_missing_required_field() {
        let raw = br#"{ "schemaVersion": "", "auditRun": {}, "results": {} }"#;
        let reason = admit(raw).expect_err("empty schemaVersion must be rejected");
        assert!(matches!(reason, SkipReason::MissingField("schemaVersion")));

        let raw = br#"{ "schemaVersion": "1.0", "auditRun": {} }"#;
        let reason = admit(raw).expect_err("missing results must be rejected");
        assert!(matches!(reason, SkipReason::MissingField("results")));
    }

    #[test]
    fn admit_distinguishes_parse_and_object_failures() {
        assert!(matches!(admit(b"{ not json"), Err(SkipReason::Parse(_))));
        assert!(matches!(admit(b"[1, 2]"), Err(SkipReason::NotAnObject)));
    }

    #[test]
    fn admit_tolerates_wrong_typed_passthrough_fields() {
        let raw = br#"{
            "schemaVersion": 1,
            "auditRun": { "auditRunId": 17, "durationMs": "1200", "finishedAt": false, "startedAt": "2024-01-01T12:00:00Z" },
            "standard": "EN301549",
            "environment": "ci",
            "scope": { "siteId": 42, "pages": "all" },
            "results": {
                "normalisedFindings": {
                    "compliance": [{ "wcagCriterionId": "1.1.1", "ruleId": 42, "occurrenceCount": 2 }],
                    "other": "none"
                }
            }
        }"#;

        let run = admit(raw).expect("structurally valid run should be admitted");
        assert_eq!(run.site_id(), Some("42"));
        assert_eq!(run.audit_run.audit_run_id.as_deref(), Some("17"));
        assert!(run.standard.is_none());
        assert_eq!(run.findings().compliance.len(), 1);
        assert_eq!(run.findings().compliance[0].rule_id.as_deref(), Some("42"));
        assert!(run.findings().other.is_empty());
    }

    #[test]
    fn admit_reads_non_object_sections_as_empty() {
        let raw = br#"{ "schemaVersion": "1.0", "auditRun": "yesterday", "results": [1] }"#;

        let run = admit(raw).expect("present sections are enough for admission");
        assert!(run.audit_run.started_at.is_none());
        assert!(run.findings().compliance.is_empty());
    }

    #[test]
    fn json_paths_are_matched_by_suffix() {
        assert!(is_json_path(Path::new("/audits/site/run-1.json")));
        assert!(!is_json_path(Path::new("/audits/site/run-1.json.bak")));
        assert!(!is_json_path(Path::new("/audits/site/notes.txt")));
        assert!(!is_json_path(Path::new("/audits/site/RUN.JSON")));
    }
}

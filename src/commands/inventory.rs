use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::analysis::{
    AuditRunLoader, LoadedRun, TracingSkipObserver, load_latest_audit_runs_by_site,
};
use crate::cli::{AnalysisMode, InventoryArgs};
use crate::model::{AuditInventoryManifest, InventoryEntry};
use crate::util::{now_utc_string, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.audits, args.mode)?;

    for entry in &manifest.runs {
        info!(
            site_id = %entry.site_id.as_deref().unwrap_or_default(),
            run_id = %entry.audit_run_id.as_deref().unwrap_or_default(),
            started_at = %entry.started_at.as_deref().unwrap_or_default(),
            compliance = entry.compliance_findings,
            other = entry.other_findings,
            path = %entry.path,
            "admitted audit run"
        );
    }

    info!(
        runs = manifest.run_count,
        skipped = manifest.skipped.total,
        mode = %manifest.mode,
        "inventory completed"
    );

    if let Some(manifest_path) = &args.manifest_path {
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote inventory manifest");
    }

    Ok(())
}

pub fn build_manifest(audits: &Path, mode: AnalysisMode) -> Result<AuditInventoryManifest> {
    let observer = TracingSkipObserver::new();

    let source_directory = std::path::absolute(audits)
        .with_context(|| format!("failed to resolve audit directory {}", audits.display()))?;

    let runs = match mode {
        AnalysisMode::All => AuditRunLoader::open(&source_directory)?
            .admitted(&observer)
            .collect::<Result<Vec<LoadedRun>>>()?,
        AnalysisMode::Latest => load_latest_audit_runs_by_site(&source_directory, &observer)?,
    };

    let mut entries: Vec<InventoryEntry> = runs.iter().map(inventory_entry).collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(AuditInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_directory.display().to_string(),
        mode: mode.as_str().to_string(),
        run_count: entries.len(),
        runs: entries,
        skipped: observer.tally(),
    })
}

fn inventory_entry(loaded: &LoadedRun) -> InventoryEntry {
    let findings = loaded.run.findings();

    InventoryEntry {
        path: loaded.path.display().to_string(),
        site_id: loaded.run.site_id().map(ToOwned::to_owned),
        audit_run_id: loaded.run.audit_run.audit_run_id.clone(),
        started_at: loaded.run.audit_run.started_at.clone(),
        compliance_findings: findings.compliance.len(),
        other_findings: findings.other.len(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write_run(dir: &Path, name: &str, run_id: &str, started_at: &str) {
        let run = json!({
            "schemaVersion": "1.0",
            "auditRun": { "auditRunId": run_id, "startedAt": started_at },
            "scope": { "siteId": "site-a" },
            "results": { "normalisedFindings": { "compliance": [{ "wcagCriterionId": "1.1.1" }], "other": [] } }
        });
        fs::write(dir.join(name), run.to_string()).expect("fixture file");
    }

    #[test]
    fn build_manifest_lists_admitted_runs_sorted_by_path() {
        let dir = TempDir::new().expect("temp dir");
        write_run(dir.path(), "b.json", "run-b", "2025-02-01T00:00:00Z");
        write_run(dir.path(), "a.json", "run-a", "2025-01-01T00:00:00Z");
        fs::write(dir.path().join("c.json"), "{}").expect("fixture file");

        let manifest = build_manifest(dir.path(), AnalysisMode::All).expect("manifest");

        assert_eq!(manifest.run_count, 2);
        let ids: Vec<_> = manifest
            .runs
            .iter()
            .filter_map(|entry| entry.audit_run_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["run-a", "run-b"]);
        assert_eq!(manifest.runs[0].compliance_findings, 1);
        assert_eq!(manifest.skipped.count("missing_field"), 1);
    }

    #[test]
    fn build_manifest_in_latest_mode_keeps_one_run_per_site() {
        let dir = TempDir::new().expect("temp dir");
        write_run(dir.path(), "a.json", "run-a", "2025-01-01T00:00:00Z");
        write_run(dir.path(), "b.json", "run-b", "2025-02-01T00:00:00Z");

        let manifest = build_manifest(dir.path(), AnalysisMode::Latest).expect("manifest");

        assert_eq!(manifest.run_count, 1);
        assert_eq!(manifest.runs[0].audit_run_id.as_deref(), Some("run-b"));
        assert_eq!(manifest.mode, "latest");
    }

    #[test]
    fn build_manifest_reports_the_absolute_root_in_both_modes() {
        let dir = TempDir::new().expect("temp dir");
        write_run(dir.path(), "a.json", "run-a", "2025-01-01T00:00:00Z");
        let expected = std::path::absolute(dir.path()).expect("absolute path");

        for mode in [AnalysisMode::All, AnalysisMode::Latest] {
            let manifest = build_manifest(dir.path(), mode).expect("manifest");
            assert_eq!(manifest.source_directory, expected.display().to_string());
        }
    }
}

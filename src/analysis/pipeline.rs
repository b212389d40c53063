use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use super::aggregations::{
    MergedFindings, PrincipleTotals, WcagTreeResult, violations_by_principle,
    violations_by_wcag_tree,
};
use super::latest::select_latest_per_site;
use super::loader::{AuditRunLoader, LoadedRun};
use super::observer::SkipObserver;
use super::sites::{SiteSummary, SiteViolationAccumulator};
use super::standard::Standard;
use crate::cli::AnalysisMode;
use crate::util::now_utc_string;

#[derive(Copy, Clone, Debug, Default)]
pub struct AnalysisOptions {
    pub mode: AnalysisMode,
    /// Adds the standalone per-principle totals to the aggregations.
    pub include_principle_totals: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub generated_at: String,
    pub aggregations: Aggregations,
    pub sites: Vec<SiteSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregations {
    pub violations_by_wcag_tree: WcagTreeResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations_by_principle: Option<PrincipleTotals>,
}

/// Everything collected from the runs admitted in one invocation.
#[derive(Debug, Default)]
pub struct FoldedRuns {
    pub findings: MergedFindings,
    pub sites: SiteViolationAccumulator,
    pub runs_folded: usize,
}

impl FoldedRuns {
    fn fold(&mut self, loaded: &LoadedRun) {
        debug!(
            path = %loaded.path.display(),
            site_id = %loaded.run.site_id().unwrap_or_default(),
            started_at = %loaded.run.audit_run.started_at.as_deref().unwrap_or_default(),
            "folding audit run"
        );

        self.findings.extend_from(loaded.run.findings());
        self.sites.fold(&loaded.run);
        self.runs_folded += 1;
    }
}

/// Walks `root` and folds admitted runs per `mode`.
///
/// `Latest` drains the whole walk to pick one run per site before folding;
/// `All` folds every admitted run as it is read.
pub fn fold_audit_runs(
    root: &Path,
    mode: AnalysisMode,
    observer: &dyn SkipObserver,
) -> Result<FoldedRuns> {
    let loader = AuditRunLoader::open(root)?;
    info!(root = %loader.root().display(), mode = mode.as_str(), "collecting audit runs");

    let mut folded = FoldedRuns::default();

    match mode {
        AnalysisMode::Latest => {
            let latest = select_latest_per_site(loader.admitted(observer), observer)?;
            info!(sites = latest.len(), "resolved latest audit run per site");
            for loaded in &latest {
                folded.fold(loaded);
            }
        }
        AnalysisMode::All => {
            for loaded in loader.admitted(observer) {
                folded.fold(&loaded?);
            }
        }
    }

    info!(
        runs = folded.runs_folded,
        sites = folded.sites.len(),
        findings = folded.findings.len(),
        "audit runs folded"
    );

    Ok(folded)
}

pub fn run_aggregated_analysis(
    root: &Path,
    standard: &Standard,
    options: AnalysisOptions,
    observer: &dyn SkipObserver,
) -> Result<AnalysisResult> {
    let generated_at = now_utc_string();
    let folded = fold_audit_runs(root, options.mode, observer)?;

    let principle_totals = options
        .include_principle_totals
        .then(|| violations_by_principle(&folded.findings, standard));

    let wcag_tree = violations_by_wcag_tree(&folded.findings, standard);
    wcag_tree
        .check_consistency()
        .context("aggregated WCAG tree totals are inconsistent")?;

    Ok(AnalysisResult {
        generated_at,
        aggregations: Aggregations {
            violations_by_wcag_tree: wcag_tree,
            violations_by_principle: principle_totals,
        },
        sites: folded.sites.into_summaries(),
    })
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{
    Aggregations, AnalysisOptions, AnalysisResult, Principle, SiteSummary, SkipTally, Standard,
    TracingSkipObserver, run_aggregated_analysis, to_csv_wcag_flat,
};
use crate::cli::{AnalyzeArgs, OutputFormat};
use crate::config::{AnalysisConfig, ResolvedAnalysis};
use crate::util::{utc_date_compact, write_json_pretty, write_text};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedAnalysis<'a> {
    generated_at: &'a str,
    standard: StandardSummary<'a>,
    mode: &'static str,
    source: SourceSummary,
    skipped: &'a SkipTally,
    aggregations: &'a Aggregations,
    sites: &'a [SiteSummary],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StandardSummary<'a> {
    standard_id: Option<&'a str>,
    wcag_version: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceSummary {
    audits_path: String,
}

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    let settings = ResolvedAnalysis::resolve(&args, config)?;
    let audits_path = std::path::absolute(&settings.audits_path).with_context(|| {
        format!("failed to resolve audit directory {}", settings.audits_path.display())
    })?;

    info!(
        audits = %audits_path.display(),
        standard = %settings.standard_path.display(),
        mode = settings.mode.as_str(),
        "starting aggregated analysis"
    );

    let standard = Standard::load(&settings.standard_path)?;
    let observer = TracingSkipObserver::new();
    let result = run_aggregated_analysis(
        &audits_path,
        &standard,
        AnalysisOptions {
            mode: settings.mode,
            include_principle_totals: settings.include_principle_totals,
        },
        &observer,
    )?;
    let skipped = observer.tally();

    if args.dry_run {
        info!(skipped = skipped.total, "analysis dry-run complete");
    } else {
        persist(&settings, &standard, &audits_path, &result, &skipped)?;
    }

    log_summary(&result, &skipped);

    Ok(())
}

fn persist(
    settings: &ResolvedAnalysis,
    standard: &Standard,
    audits_path: &Path,
    result: &AnalysisResult,
    skipped: &SkipTally,
) -> Result<()> {
    let date_suffix = utc_date_compact(Utc::now());

    if settings.wants(OutputFormat::Json) {
        let payload = PersistedAnalysis {
            generated_at: &result.generated_at,
            standard: StandardSummary {
                standard_id: standard.standard_id.as_deref(),
                wcag_version: standard.wcag_version.as_deref(),
            },
            mode: settings.mode.as_str(),
            source: SourceSummary {
                audits_path: audits_path.display().to_string(),
            },
            skipped,
            aggregations: &result.aggregations,
            sites: &result.sites,
        };

        let path = output_path(settings, &date_suffix, "json");
        write_json_pretty(&path, &payload)?;
        info!(path = %path.display(), "wrote analysis json");
    }

    if settings.wants(OutputFormat::Csv) {
        let csv = to_csv_wcag_flat(Some(&result.aggregations.violations_by_wcag_tree));

        let path = output_path(settings, &date_suffix, "csv");
        write_text(&path, &csv)?;
        info!(path = %path.display(), "wrote analysis csv");
    }

    Ok(())
}

fn output_path(settings: &ResolvedAnalysis, date_suffix: &str, extension: &str) -> PathBuf {
    settings.output_directory.join(format!(
        "{}-{date_suffix}.{extension}",
        settings.filename_prefix
    ))
}

fn log_summary(result: &AnalysisResult, skipped: &SkipTally) {
    let tree = &result.aggregations.violations_by_wcag_tree;

    info!(
        total_violations = tree.total_violations,
        sites = result.sites.len(),
        skipped = skipped.total,
        "analysis summary"
    );

    if tree.is_empty() {
        warn!("no compliance findings resolved against the standard");
    }

    for (principle, node) in tree.tree.iter() {
        info!(principle = %principle, total = node.total, "principle violations");
    }

    if let Some(totals) = &result.aggregations.violations_by_principle {
        for principle in Principle::ALL {
            info!(
                principle = principle.as_str(),
                total = totals.by_principle.get(principle),
                "principle totals"
            );
        }
    }
}

use serde::Serialize;

use super::aggregations::saturating_sum;
use super::ordered::OrderedNodes;
use crate::model::{AuditRun, NormalisedFinding};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteViolations {
    pub compliance: u64,
    pub other: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub site_id: String,
    pub violations: SiteViolations,
}

/// Raw occurrence totals of one run. Missing or non-numeric counts add zero.
pub fn count_run_violations(run: &AuditRun) -> SiteViolations {
    let findings = run.findings();

    SiteViolations {
        compliance: saturating_sum(findings.compliance.iter().map(NormalisedFinding::summary_weight)),
        other: saturating_sum(findings.other.iter().map(NormalisedFinding::summary_weight)),
    }
}

/// Running per-site totals, kept in the order sites are first folded.
#[derive(Debug, Default)]
pub struct SiteViolationAccumulator {
    sites: OrderedNodes<SiteViolations>,
}

impl SiteViolationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one run to its site's totals. Returns `false` when the run has
    /// no resolvable site id and was left out.
    pub fn fold(&mut self, run: &AuditRun) -> bool {
        let Some(site_id) = run.site_id() else {
            return false;
        };

        let counted = count_run_violations(run);
        let totals = self
            .sites
            .entry_or_insert_with(site_id, SiteViolations::default);
        totals.compliance = totals.compliance.saturating_add(counted.compliance);
        totals.other = totals.other.saturating_add(counted.other);

        true
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn into_summaries(self) -> Vec<SiteSummary> {
        self.sites
            .iter()
            .map(|(site_id, violations)| SiteSummary {
                site_id: site_id.to_string(),
                violations: violations.clone(),
            })
            .collect()
    }
}

use anyhow::{Result, bail};
use serde::Serialize;

use super::ordered::OrderedNodes;
use super::standard::Standard;
use crate::model::{NormalisedFinding, NormalisedFindings, guideline_id};

/// The four top-level WCAG organising principles.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Principle {
    Perceivable,
    Operable,
    Understandable,
    Robust,
}

impl Principle {
    pub const ALL: [Principle; 4] = [
        Self::Perceivable,
        Self::Operable,
        Self::Understandable,
        Self::Robust,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Perceivable => "Perceivable",
            Self::Operable => "Operable",
            Self::Understandable => "Understandable",
            Self::Robust => "Robust",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|principle| principle.as_str() == value)
    }
}

/// Findings of every folded run, merged per classification.
#[derive(Debug, Clone, Default)]
pub struct MergedFindings {
    pub compliance: Vec<NormalisedFinding>,
    pub other: Vec<NormalisedFinding>,
}

impl MergedFindings {
    pub fn extend_from(&mut self, findings: &NormalisedFindings) {
        self.compliance.extend(findings.compliance.iter().cloned());
        self.other.extend(findings.other.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.compliance.len() + self.other.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipleTotals {
    pub total_violations: u64,
    pub by_principle: ByPrinciple,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ByPrinciple {
    pub perceivable: u64,
    pub operable: u64,
    pub understandable: u64,
    pub robust: u64,
}

impl ByPrinciple {
    pub fn get(&self, principle: Principle) -> u64 {
        match principle {
            Principle::Perceivable => self.perceivable,
            Principle::Operable => self.operable,
            Principle::Understandable => self.understandable,
            Principle::Robust => self.robust,
        }
    }

    fn slot(&mut self, principle: Principle) -> &mut u64 {
        match principle {
            Principle::Perceivable => &mut self.perceivable,
            Principle::Operable => &mut self.operable,
            Principle::Understandable => &mut self.understandable,
            Principle::Robust => &mut self.robust,
        }
    }
}

/// Principle → guideline → criterion violation counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WcagTreeResult {
    pub total_violations: u64,
    pub tree: OrderedNodes<PrincipleNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrincipleNode {
    pub total: u64,
    pub guidelines: OrderedNodes<GuidelineNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuidelineNode {
    pub total: u64,
    pub criteria: OrderedNodes<u64>,
}

impl WcagTreeResult {
    /// Adds `weight` to one criterion and to every total above it.
    pub fn record(&mut self, principle: Principle, criterion_id: &str, weight: u64) {
        let principle_node = self
            .tree
            .entry_or_insert_with(principle.as_str(), PrincipleNode::default);
        let guideline_node = principle_node
            .guidelines
            .entry_or_insert_with(&guideline_id(criterion_id), GuidelineNode::default);
        let criterion_count = guideline_node
            .criteria
            .entry_or_insert_with(criterion_id, || 0);

        *criterion_count = criterion_count.saturating_add(weight);
        guideline_node.total = guideline_node.total.saturating_add(weight);
        principle_node.total = principle_node.total.saturating_add(weight);
        self.total_violations = self.total_violations.saturating_add(weight);
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Verifies that every total equals the sum of its children.
    pub fn check_consistency(&self) -> Result<()> {
        let mut principles_sum: u64 = 0;

        for (principle, principle_node) in self.tree.iter() {
            let mut guidelines_sum: u64 = 0;

            for (guideline, guideline_node) in principle_node.guidelines.iter() {
                let criteria_sum = saturating_sum(guideline_node.criteria.values().copied());
                if criteria_sum != guideline_node.total {
                    bail!(
                        "guideline {principle}/{guideline} total {} != criteria sum {criteria_sum}",
                        guideline_node.total
                    );
                }
                guidelines_sum = guidelines_sum.saturating_add(guideline_node.total);
            }

            if guidelines_sum != principle_node.total {
                bail!(
                    "principle {principle} total {} != guidelines sum {guidelines_sum}",
                    principle_node.total
                );
            }
            principles_sum = principles_sum.saturating_add(principle_node.total);
        }

        if principles_sum != self.total_violations {
            bail!(
                "total violations {} != principles sum {principles_sum}",
                self.total_violations
            );
        }

        Ok(())
    }
}

/// Occurrence counts clamp at `u64::MAX` instead of overflowing.
pub(crate) fn saturating_sum(counts: impl IntoIterator<Item = u64>) -> u64 {
    counts.into_iter().fold(0, u64::saturating_add)
}

/// Compliance findings that resolve to a POUR principle, with their weight.
fn resolved_violations<'a>(
    findings: &'a MergedFindings,
    standard: &'a Standard,
) -> impl Iterator<Item = (&'a str, Principle, u64)> + 'a {
    findings.compliance.iter().filter_map(move |finding| {
        let criterion_id = finding.wcag_criterion_id.as_deref()?;
        let principle = standard.principle_of(criterion_id)?;
        Some((criterion_id, principle, finding.violation_weight()))
    })
}

pub fn violations_by_principle(findings: &MergedFindings, standard: &Standard) -> PrincipleTotals {
    let mut totals = PrincipleTotals::default();

    for (_, principle, weight) in resolved_violations(findings, standard) {
        let slot = totals.by_principle.slot(principle);
        *slot = slot.saturating_add(weight);
        totals.total_violations = totals.total_violations.saturating_add(weight);
    }

    totals
}

pub fn violations_by_wcag_tree(findings: &MergedFindings, standard: &Standard) -> WcagTreeResult {
    let mut result = WcagTreeResult::default();

    for (criterion_id, principle, weight) in resolved_violations(findings, standard) {
        result.record(principle, criterion_id, weight);
    }

    result
}

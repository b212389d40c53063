use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

/// Why an input unit was left out of the analysis.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("failed to read file: {0}")]
    Read(#[source] std::io::Error),

    #[error("invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("missing or empty `{0}`")]
    MissingField(&'static str),

    #[error("unexpected audit-run shape: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("no resolvable site id")]
    MissingSiteId,

    #[error("missing or unparseable `auditRun.startedAt`")]
    InvalidStartedAt,
}

impl SkipReason {
    /// Stable label used for tallies and manifests.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read(_) => "read_error",
            Self::Parse(_) => "invalid_json",
            Self::NotAnObject => "not_an_object",
            Self::MissingField(_) => "missing_field",
            Self::Shape(_) => "shape_mismatch",
            Self::MissingSiteId => "missing_site_id",
            Self::InvalidStartedAt => "invalid_started_at",
        }
    }
}

/// Receives tolerated skips. The pipeline never depends on a particular sink.
pub trait SkipObserver {
    fn on_skip(&self, path: &Path, reason: &SkipReason);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipTally {
    pub total: usize,
    pub by_kind: BTreeMap<&'static str, usize>,
}

impl SkipTally {
    pub fn record(&mut self, reason: &SkipReason) {
        self.total += 1;
        *self.by_kind.entry(reason.kind()).or_insert(0) += 1;
    }

    #[cfg(test)]
    pub fn count(&self, kind: &str) -> usize {
        self.by_kind.get(kind).copied().unwrap_or(0)
    }
}

/// Counts skips without emitting anything.
#[derive(Debug, Default)]
pub struct CountingSkipObserver {
    tally: RefCell<SkipTally>,
}

impl CountingSkipObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self) -> SkipTally {
        self.tally.borrow().clone()
    }
}

impl SkipObserver for CountingSkipObserver {
    fn on_skip(&self, _path: &Path, reason: &SkipReason) {
        self.tally.borrow_mut().record(reason);
    }
}

/// Logs every skip as a warning and keeps a tally for the run summary.
#[derive(Debug, Default)]
pub struct TracingSkipObserver {
    counts: CountingSkipObserver,
}

impl TracingSkipObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self) -> SkipTally {
        self.counts.tally()
    }
}

impl SkipObserver for TracingSkipObserver {
    fn on_skip(&self, path: &Path, reason: &SkipReason) {
        warn!(path = %path.display(), kind = reason.kind(), reason = %reason, "skipping audit run");
        self.counts.on_skip(path, reason);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn counting_observer_groups_skips_by_kind() {
        let observer = CountingSkipObserver::new();
        let path = PathBuf::from("/audits/a.json");

        observer.on_skip(&path, &SkipReason::MissingField("results"));
        observer.on_skip(&path, &SkipReason::MissingField("auditRun"));
        observer.on_skip(&path, &SkipReason::MissingSiteId);

        let tally = observer.tally();
        assert_eq!(tally.total, 3);
        assert_eq!(tally.count("missing_field"), 2);
        assert_eq!(tally.count("missing_site_id"), 1);
        assert_eq!(tally.count("invalid_json"), 0);
    }

    #[test]
    fn skip_reason_messages_name_the_field() {
        let reason = SkipReason::MissingField("schemaVersion");
        assert_eq!(reason.to_string(), "missing or empty `schemaVersion`");
    }
}

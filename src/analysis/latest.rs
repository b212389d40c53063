use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::loader::{AuditRunLoader, LoadedRun};
use super::observer::{SkipObserver, SkipReason};
use super::ordered::OrderedNodes;

/// Walks `root` and keeps the most recent admitted run of every site.
pub fn load_latest_audit_runs_by_site(
    root: &Path,
    observer: &dyn SkipObserver,
) -> Result<Vec<LoadedRun>> {
    let loader = AuditRunLoader::open(root)?;
    select_latest_per_site(loader.admitted(observer), observer)
}

/// Drains `runs` and keeps one run per site id: the one with the strictly
/// greatest `startedAt`. On equal timestamps the run seen first stays.
///
/// Runs without a site id or a parseable `startedAt` are reported to
/// `observer` and dropped. The result lists sites in first-seen order.
pub fn select_latest_per_site<I>(runs: I, observer: &dyn SkipObserver) -> Result<Vec<LoadedRun>>
where
    I: IntoIterator<Item = Result<LoadedRun>>,
{
    let mut latest: OrderedNodes<Option<(DateTime<Utc>, LoadedRun)>> = OrderedNodes::new();

    for loaded in runs {
        let loaded = loaded?;

        let Some(site_id) = loaded.run.site_id().map(ToOwned::to_owned) else {
            observer.on_skip(&loaded.path, &SkipReason::MissingSiteId);
            continue;
        };
        let Some(started_at) = loaded.run.started_at() else {
            observer.on_skip(&loaded.path, &SkipReason::InvalidStartedAt);
            continue;
        };

        let slot = latest.entry_or_insert_with(&site_id, || None);
        let replace = match slot {
            Some((current, _)) => started_at > *current,
            None => true,
        };

        if replace {
            debug!(
                site_id = %site_id,
                started_at = %started_at,
                path = %loaded.path.display(),
                "latest audit run candidate"
            );
            *slot = Some((started_at, loaded));
        }
    }

    Ok(latest
        .into_values()
        .flatten()
        .map(|(_, loaded)| loaded)
        .collect())
}

//! Audit-run ingestion and aggregation: directory walk, validated loading,
//! latest-run selection, WCAG aggregation, site summaries and CSV export.

mod aggregations;
mod export;
mod latest;
mod loader;
mod observer;
mod ordered;
mod pipeline;
mod sites;
mod standard;
mod walker;

pub use aggregations::Principle;
pub use export::to_csv_wcag_flat;
pub use latest::load_latest_audit_runs_by_site;
pub use loader::{AuditRunLoader, LoadedRun};
pub use observer::{SkipTally, TracingSkipObserver};
pub use pipeline::{Aggregations, AnalysisOptions, AnalysisResult, run_aggregated_analysis};
pub use sites::SiteSummary;
pub use standard::Standard;

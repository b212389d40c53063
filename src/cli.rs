use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "wcag-audit-analysis",
    version,
    about = "Aggregate accessibility audit runs into WCAG compliance reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Inventory(InventoryArgs),
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Latest,
    All,
}

impl AnalysisMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::All => "all",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// JSON analysis config; flags given here take precedence over it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory tree holding audit-run JSON files.
    #[arg(long)]
    pub audits: Option<PathBuf>,

    /// Reference standard JSON mapping criteria to principles.
    #[arg(long)]
    pub standard: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub mode: Option<AnalysisMode>,

    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long)]
    pub filename_prefix: Option<String>,

    #[arg(long = "format", value_enum)]
    pub formats: Vec<OutputFormat>,

    #[arg(long, default_value_t = false)]
    pub include_principle_totals: bool,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long)]
    pub audits: PathBuf,

    #[arg(long, value_enum, default_value_t = AnalysisMode::All)]
    pub mode: AnalysisMode,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

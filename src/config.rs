use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::{AnalysisMode, AnalyzeArgs, OutputFormat};

const DEFAULT_OUTPUT_DIRECTORY: &str = "./analysis-output";
const DEFAULT_FILENAME_PREFIX: &str = "accessibility-analysis";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    #[serde(default)]
    pub audits_path: Option<PathBuf>,
    #[serde(default)]
    pub standard: Option<PathBuf>,
    #[serde(default)]
    pub mode: Option<AnalysisMode>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub filename_prefix: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<OutputFormat>>,
}

/// Settings of one `analyze` invocation after applying flags over config.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAnalysis {
    pub audits_path: PathBuf,
    pub standard_path: PathBuf,
    pub mode: AnalysisMode,
    pub output_directory: PathBuf,
    pub filename_prefix: String,
    pub formats: Vec<OutputFormat>,
    pub include_principle_totals: bool,
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read(path).with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

impl ResolvedAnalysis {
    pub fn resolve(args: &AnalyzeArgs, config: AnalysisConfig) -> Result<Self> {
        let audits_path = args
            .audits
            .clone()
            .or(config.audits_path)
            .context("no audit directory given: pass --audits or set `auditsPath` in the config")?;
        let standard_path = args
            .standard
            .clone()
            .or(config.standard)
            .context("no standard given: pass --standard or set `standard` in the config")?;

        let formats = if args.formats.is_empty() {
            config
                .output
                .formats
                .unwrap_or_else(|| vec![OutputFormat::Json])
        } else {
            args.formats.clone()
        };

        Ok(Self {
            audits_path,
            standard_path,
            mode: args.mode.or(config.mode).unwrap_or_default(),
            output_directory: args
                .out
                .clone()
                .or(config.output.directory)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIRECTORY)),
            filename_prefix: args
                .filename_prefix
                .clone()
                .or(config.output.filename_prefix)
                .unwrap_or_else(|| DEFAULT_FILENAME_PREFIX.to_string()),
            formats,
            include_principle_totals: args.include_principle_totals,
        })
    }

    pub fn wants(&self, format: OutputFormat) -> bool {
        self.formats.contains(&format)
    }
}

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::io::AnalysisReport;

/// Configuration for Stage 3 rendering
#[derive(Debug, Clone)]
pub struct Stage3Config {
    /// Whether to write the JSON report
    pub generate_json: bool,
    /// Whether to write the markdown report
    pub generate_markdown: bool,
    /// Whether to write the action list CSV
    pub generate_actions_csv: bool,
}

impl Default for Stage3Config {
    fn default() -> Self {
        Self {
            generate_json: true,
            generate_markdown: true,
            generate_actions_csv: true,
        }
    }
}

/// Destination paths for Stage 3; `None` skips that output
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderTargets<'a> {
    pub json: Option<&'a Path>,
    pub markdown: Option<&'a Path>,
    pub actions_csv: Option<&'a Path>,
}

/// Result of Stage 3 rendering
#[derive(Debug, Default)]
pub struct Stage3Result {
    pub json_path: Option<PathBuf>,
    pub markdown_path: Option<PathBuf>,
    pub actions_csv_path: Option<PathBuf>,
}

/// Execute Stage 3: Rendering
///
/// Produces up to three views of a finished analysis:
/// 1. JSON report with id, timestamp, narrative and structured record
/// 2. Markdown document for reading
/// 3. CSV action list for spreadsheets
pub fn execute_stage3(
    report: &AnalysisReport,
    targets: RenderTargets<'_>,
    config: &Stage3Config,
) -> Result<Stage3Result> {
    let mut result = Stage3Result::default();

    if config.generate_json {
        if let Some(path) = targets.json {
            info!("Writing JSON report to {:?}", path);
            report.write_json(path)?;
            result.json_path = Some(path.to_path_buf());
        }
    }

    if config.generate_markdown {
        if let Some(path) = targets.markdown {
            info!("Writing markdown report to {:?}", path);
            report.write_markdown(path)?;
            result.markdown_path = Some(path.to_path_buf());
        }
    }

    if config.generate_actions_csv {
        if let Some(path) = targets.actions_csv {
            info!("Writing action list to {:?}", path);
            report.write_actions_csv(path)?;
            result.actions_csv_path = Some(path.to_path_buf());
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, StructuredRecord};

    #[test]
    fn test_stage3_config_default() {
        let config = Stage3Config::default();
        assert!(config.generate_json);
        assert!(config.generate_markdown);
        assert!(config.generate_actions_csv);
    }

    #[test]
    fn test_writes_requested_outputs_only() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("report.json");
        let csv = dir.path().join("actions.csv");
        let report = AnalysisReport::new(
            "reuniao.txt",
            None,
            AnalysisResult {
                narrative: "relatório".to_string(),
                structured: StructuredRecord::default(),
                retrieval_count: 0,
            },
        );

        let targets = RenderTargets {
            json: Some(&json),
            markdown: None,
            actions_csv: Some(&csv),
        };
        let config = Stage3Config {
            generate_actions_csv: false,
            ..Default::default()
        };
        let result = execute_stage3(&report, targets, &config).unwrap();

        assert_eq!(result.json_path.as_deref(), Some(json.as_path()));
        assert!(result.markdown_path.is_none());
        assert!(result.actions_csv_path.is_none());
        assert!(json.exists());
        assert!(!csv.exists());
    }
}

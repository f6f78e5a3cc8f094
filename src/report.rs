//! Persists workflow results as Markdown reports.
//!
//! Each completed stage gets its own numbered Markdown file; a summary
//! document links them together with timestamps and per-stage status, and a
//! machine-readable `summary.json` sits alongside it.

use crate::error::{Error, Result};
use crate::workflow::{WorkflowResult, WorkflowStage};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Paths produced by one report run.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    /// One file per completed stage, in stage order
    pub stage_files: Vec<PathBuf>,

    /// The human-readable summary Markdown
    pub summary: PathBuf,

    /// The machine-readable summary JSON
    pub summary_json: PathBuf,
}

/// Machine-readable run summary.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    generated_at: String,
    requirement: &'a str,
    stages: Vec<StageSummary>,
    failure: Option<String>,
}

#[derive(Debug, Serialize)]
struct StageSummary {
    stage: &'static str,
    completed: bool,
    file: Option<String>,
}

/// Writes workflow stage reports and the run summary.
pub struct ReportWriter {
    output_dir: PathBuf,
    base_name: String,
}

impl ReportWriter {
    /// Creates a report writer for the given directory and file base name.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_name: base_name.into(),
        }
    }

    /// Writes one Markdown file per completed stage plus the summary pair.
    ///
    /// Absent stages are reported as failed/skipped rather than erroring.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory or any report file cannot be
    /// written.
    pub fn write(&self, requirement: &str, result: &WorkflowResult) -> Result<ReportPaths> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;

        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut stage_files = Vec::new();
        let mut stage_summaries = Vec::new();

        for (index, (stage, output)) in Self::stage_outputs(result).into_iter().enumerate() {
            let filename = match output {
                Some(content) => {
                    let filename =
                        format!("{}_{}_{}.md", self.base_name, index + 1, Self::slug(stage));
                    let path = self.output_dir.join(&filename);

                    let body = format!(
                        "# Stage {}: {}\n\nGenerated: {}\n\n---\n\n{}\n",
                        index + 1,
                        Self::title(stage),
                        timestamp,
                        content
                    );
                    fs::write(&path, body).map_err(|e| Error::io(&path, e))?;

                    info!(stage = stage.name(), path = %path.display(), "wrote stage report");
                    stage_files.push(path);
                    Some(filename)
                }
                None => None,
            };

            stage_summaries.push(StageSummary {
                stage: stage.name(),
                completed: filename.is_some(),
                file: filename,
            });
        }

        let summary = self.write_summary(requirement, result, &timestamp, &stage_summaries)?;
        let summary_json =
            self.write_summary_json(requirement, result, &timestamp, stage_summaries)?;

        Ok(ReportPaths {
            stage_files,
            summary,
            summary_json,
        })
    }

    fn stage_outputs(result: &WorkflowResult) -> [(WorkflowStage, Option<&String>); 3] {
        [
            (
                WorkflowStage::Analyzing,
                result.requirement_analysis.as_ref(),
            ),
            (
                WorkflowStage::Designing,
                result.architecture_design.as_ref(),
            ),
            (
                WorkflowStage::Implementing,
                result.code_implementation.as_ref(),
            ),
        ]
    }

    fn write_summary(
        &self,
        requirement: &str,
        result: &WorkflowResult,
        timestamp: &str,
        stages: &[StageSummary],
    ) -> Result<PathBuf> {
        let mut body = String::new();
        body.push_str("# Workflow Summary\n\n");
        body.push_str(&format!("Generated: {timestamp}\n\n"));
        body.push_str(&format!("Requirement: {requirement}\n\n"));

        body.push_str("## Generated files\n\n");
        for stage in stages {
            if let Some(file) = &stage.file {
                body.push_str(&format!("- [{}]({})\n", stage.stage, file));
            }
        }

        body.push_str("\n## Stage status\n\n");
        for stage in stages {
            let mark = if stage.completed { "✓ complete" } else { "✗ not run" };
            body.push_str(&format!("- {}: {}\n", stage.stage, mark));
        }

        if let Some(failure) = &result.failure {
            body.push_str(&format!("\nHalted: {}\n", failure.error));
        }

        let path = self
            .output_dir
            .join(format!("{}_summary.md", self.base_name));
        fs::write(&path, body).map_err(|e| Error::io(&path, e))?;

        info!(path = %path.display(), "wrote workflow summary");
        Ok(path)
    }

    fn write_summary_json(
        &self,
        requirement: &str,
        result: &WorkflowResult,
        timestamp: &str,
        stages: Vec<StageSummary>,
    ) -> Result<PathBuf> {
        let summary = RunSummary {
            generated_at: timestamp.to_string(),
            requirement,
            stages,
            failure: result.failure.as_ref().map(|f| f.error.to_string()),
        };

        let path = self
            .output_dir
            .join(format!("{}_summary.json", self.base_name));
        let file = fs::File::create(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::to_writer_pretty(file, &summary).map_err(Error::from)?;

        Ok(path)
    }

    const fn slug(stage: WorkflowStage) -> &'static str {
        match stage {
            WorkflowStage::Analyzing => "requirement_analysis",
            WorkflowStage::Designing => "architecture_design",
            WorkflowStage::Implementing => "code_implementation",
        }
    }

    const fn title(stage: WorkflowStage) -> &'static str {
        match stage {
            WorkflowStage::Analyzing => "Requirement Analysis",
            WorkflowStage::Designing => "Architecture Design",
            WorkflowStage::Implementing => "Code Implementation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::StageFailure;

    fn complete_result() -> WorkflowResult {
        WorkflowResult {
            requirement_analysis: Some("analysis text".to_string()),
            architecture_design: Some("design text".to_string()),
            code_implementation: Some("implementation text".to_string()),
            failure: None,
        }
    }

    fn halted_result() -> WorkflowResult {
        WorkflowResult {
            requirement_analysis: Some("analysis text".to_string()),
            architecture_design: None,
            code_implementation: None,
            failure: Some(StageFailure {
                stage: WorkflowStage::Designing,
                error: Error::stage(
                    WorkflowStage::Designing.name(),
                    Error::http("backend down"),
                ),
            }),
        }
    }

    #[test]
    fn complete_run_writes_three_stage_files_and_summaries() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = ReportWriter::new(temp.path(), "example_1");

        let paths = writer.write("a todo manager", &complete_result()).unwrap();

        assert_eq!(paths.stage_files.len(), 3);
        assert!(temp
            .path()
            .join("example_1_1_requirement_analysis.md")
            .exists());
        assert!(temp
            .path()
            .join("example_1_2_architecture_design.md")
            .exists());
        assert!(temp
            .path()
            .join("example_1_3_code_implementation.md")
            .exists());

        let stage_one =
            std::fs::read_to_string(temp.path().join("example_1_1_requirement_analysis.md"))
                .unwrap();
        assert!(stage_one.contains("Requirement Analysis"));
        assert!(stage_one.contains("Generated: "));
        assert!(stage_one.contains("analysis text"));

        let summary = std::fs::read_to_string(&paths.summary).unwrap();
        assert!(summary.contains("a todo manager"));
        assert!(summary.contains("example_1_2_architecture_design.md"));
        assert!(summary.contains("✓ complete"));
        assert!(!summary.contains("✗ not run"));
    }

    #[test]
    fn halted_run_reports_partial_status() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = ReportWriter::new(temp.path(), "run");

        let paths = writer.write("a blog system", &halted_result()).unwrap();

        assert_eq!(paths.stage_files.len(), 1);
        assert!(temp.path().join("run_1_requirement_analysis.md").exists());
        assert!(!temp.path().join("run_2_architecture_design.md").exists());

        let summary = std::fs::read_to_string(&paths.summary).unwrap();
        assert!(summary.contains("✓ complete"));
        assert!(summary.contains("✗ not run"));
        assert!(summary.contains("backend down"));
    }

    #[test]
    fn summary_json_is_machine_readable() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = ReportWriter::new(temp.path(), "run");

        let paths = writer.write("a blog system", &halted_result()).unwrap();

        let raw = std::fs::read_to_string(&paths.summary_json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed["requirement"], "a blog system");
        assert_eq!(parsed["stages"][0]["completed"], true);
        assert_eq!(parsed["stages"][1]["completed"], false);
        assert!(parsed["failure"]
            .as_str()
            .unwrap()
            .contains("backend down"));
    }
}

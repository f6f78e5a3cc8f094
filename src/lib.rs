//! # llm-forge
//!
//! A library for turning natural-language software requirements into project
//! skeletons, architecture descriptions and generated source files through
//! chained LLM prompts.
//!
//! ## Features
//!
//! - Three-stage prompt workflow (analysis → design → implementation) with
//!   typed stage outputs and partial results on failure
//! - Project-structure extraction from Markdown tree drawings
//! - Per-file-type prompt templates with stub fallbacks
//! - Explicit, passed-down configuration — no process-wide credential state
//!
//! ## Quick Start
//!
//! ```no_run
//! use llm_forge::{Config, Workflow, ReportWriter};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .api_key("sk-your-key")
//!     .output_dir("./out")
//!     .build()?;
//!
//! let result = Workflow::new(&config)?.run("a todo manager with due dates");
//! ReportWriter::new(&config.output_dir, "todo").write("a todo manager", &result)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a chain-of-stages architecture:
//! 1. **Chain**: binds one prompt template to the model client
//! 2. **Workflow**: sequences the three chains, passing outputs along
//! 3. **Extractor**: recovers a file list from a structure document
//! 4. **Materializer**: generates and persists each extracted file

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod chain;
mod client;
mod config;
mod error;
mod materialize;
mod report;
mod template;
mod workflow;

pub mod extract;

pub use chain::Chain;
pub use client::{ModelClient, SamplingParams, TextGenerator};
pub use config::{Config, ConfigBuilder, API_KEY_ENV, BASE_URL_ENV, PLACEHOLDER_API_KEY};
pub use error::{Error, Result};
pub use extract::{extract_entries, FileKind, ProjectFileEntry};
pub use materialize::{MaterializeStats, Materializer};
pub use report::{ReportPaths, ReportWriter};
pub use template::TemplateEngine;
pub use workflow::{StageFailure, Workflow, WorkflowResult, WorkflowStage};

/// Runs the complete three-stage workflow for a requirement.
///
/// Stage failures do not surface as errors here; they are recorded on the
/// returned result, with the already-collected outputs intact.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or setup fails.
///
/// # Examples
///
/// ```no_run
/// use llm_forge::{Config, run_workflow};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder().api_key("sk-your-key").build()?;
/// let result = run_workflow(&config, "a simple calculator")?;
/// # Ok(())
/// # }
/// ```
pub fn run_workflow(config: &Config, requirement: &str) -> Result<WorkflowResult> {
    Ok(Workflow::new(config)?.run(requirement))
}

/// Extracts entries from a structure document and materializes the project.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the document contains
/// no directory tree, or the project directory cannot be created. Per-file
/// generation failures degrade to stub content instead of erroring.
pub fn build_project(config: &Config, structure_markdown: &str) -> Result<MaterializeStats> {
    let entries = extract::extract_entries(structure_markdown)?;
    Materializer::new(config)?.materialize(&entries)
}

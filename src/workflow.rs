//! Three-stage prompt-chained workflow.
//!
//! Requirement analysis, architecture design and code implementation run in
//! order, each stage fed the previous stage's full output. A stage failure
//! halts the workflow; whatever was already produced is still returned and
//! the failure is recorded on the result instead of being raised.

use crate::chain::Chain;
use crate::client::{ModelClient, TextGenerator};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::template::TemplateEngine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The stage a workflow is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStage {
    /// Turning the user requirement into a task description
    Analyzing,
    /// Turning the task description into a module structure
    Designing,
    /// Turning the module structure into code
    Implementing,
}

impl WorkflowStage {
    /// Returns the human-readable stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Analyzing => "requirement analysis",
            Self::Designing => "architecture design",
            Self::Implementing => "code implementation",
        }
    }

    /// Returns all stages in execution order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Analyzing, Self::Designing, Self::Implementing]
    }
}

/// The stage a workflow halted at, with the underlying error.
#[derive(Debug, Clone)]
pub struct StageFailure {
    /// Stage that failed
    pub stage: WorkflowStage,
    /// What went wrong
    pub error: Error,
}

/// Outputs of one workflow invocation.
///
/// Fields are filled in stage order; an absent field means the workflow
/// halted before (or at) that stage, with the cause in `failure`.
#[derive(Debug, Clone, Default)]
pub struct WorkflowResult {
    /// Output of the requirement-analysis stage
    pub requirement_analysis: Option<String>,

    /// Output of the architecture-design stage
    pub architecture_design: Option<String>,

    /// Output of the code-implementation stage
    pub code_implementation: Option<String>,

    /// Set when a stage failed and the workflow halted
    pub failure: Option<StageFailure>,
}

impl WorkflowResult {
    /// Returns true if every stage produced output.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.code_implementation.is_some() && self.failure.is_none()
    }

    fn halted(mut self, stage: WorkflowStage, error: Error) -> Self {
        let error = Error::stage(stage.name(), error);
        warn!(stage = stage.name(), %error, "workflow halted");
        self.failure = Some(StageFailure { stage, error });
        self
    }
}

/// Sequences the three chains, passing each output as the next input.
pub struct Workflow {
    generator: Box<dyn TextGenerator>,
    engine: TemplateEngine,
}

impl Workflow {
    /// Creates a workflow backed by a [`ModelClient`] for the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or engine setup fails.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_generator(Box::new(ModelClient::new(config)?))
    }

    /// Creates a workflow over an arbitrary text generator.
    ///
    /// # Errors
    ///
    /// Returns an error if template registration fails.
    pub fn with_generator(generator: Box<dyn TextGenerator>) -> Result<Self> {
        Ok(Self {
            generator,
            engine: TemplateEngine::new()?,
        })
    }

    /// Runs the full three-stage workflow for a user requirement.
    ///
    /// Never returns an error: failures halt the pipeline and are recorded
    /// on the returned result alongside the outputs collected so far.
    #[must_use]
    pub fn run(&self, user_requirement: &str) -> WorkflowResult {
        let mut result = WorkflowResult::default();
        let generator = self.generator.as_ref();

        info!("stage 1/3: analyzing requirement");
        let analysis = match Chain::requirement_analysis(generator, &self.engine).run(user_requirement)
        {
            Ok(text) => text,
            Err(e) => return result.halted(WorkflowStage::Analyzing, e),
        };
        result.requirement_analysis = Some(analysis.clone());
        info!("requirement analysis complete");

        info!("stage 2/3: designing architecture");
        let design = match Chain::architecture_design(generator, &self.engine).run(&analysis) {
            Ok(text) => text,
            Err(e) => return result.halted(WorkflowStage::Designing, e),
        };
        result.architecture_design = Some(design.clone());
        info!("architecture design complete");

        info!("stage 3/3: implementing code");
        let implementation = match Chain::code_implementation(generator, &self.engine).run(&design) {
            Ok(text) => text,
            Err(e) => return result.halted(WorkflowStage::Implementing, e),
        };
        result.code_implementation = Some(implementation);
        info!("code implementation complete");

        result
    }

    /// Runs a single stage in isolation, for debugging.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stage`] if the stage's chain fails.
    pub fn run_stage(&self, stage: WorkflowStage, input: &str) -> Result<String> {
        let generator = self.generator.as_ref();
        let chain = match stage {
            WorkflowStage::Analyzing => Chain::requirement_analysis(generator, &self.engine),
            WorkflowStage::Designing => Chain::architecture_design(generator, &self.engine),
            WorkflowStage::Implementing => Chain::code_implementation(generator, &self.engine),
        };

        chain.run(input).map_err(|e| Error::stage(stage.name(), e))
    }

    /// Generates a project-structure document for a requirement.
    ///
    /// This is the single-call skeleton path; feed its output (after saving)
    /// to [`crate::extract::extract_entries`] and the materializer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stage`] if generation fails.
    pub fn scaffold(&self, requirement: &str) -> Result<String> {
        Chain::skeleton(self.generator.as_ref(), &self.engine)
            .run(requirement)
            .map_err(|e| Error::stage("project skeleton", e))
    }
}

//! Run the full three-stage workflow and save the reports.
//!
//! Set `LLM_FORGE_API_KEY` before running:
//!
//! ```sh
//! LLM_FORGE_API_KEY=sk-... cargo run --example full_workflow
//! ```

use llm_forge::{Config, ReportWriter, Workflow};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let requirement = "a simple todo manager with add, remove and complete";

    let result = Workflow::new(&config)?.run(requirement);

    let reports = ReportWriter::new(&config.output_dir, "demo").write(requirement, &result)?;
    println!("summary: {}", reports.summary.display());

    if let Some(failure) = result.failure {
        eprintln!("halted at {}: {}", failure.stage.name(), failure.error);
    }

    Ok(())
}

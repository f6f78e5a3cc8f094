//! Build a project from an existing structure document.
//!
//! Generate one first with `llm-forge scaffold "..."`, then:
//!
//! ```sh
//! LLM_FORGE_API_KEY=sk-... cargo run --example build_project
//! ```

use llm_forge::{build_project, Config};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let markdown = std::fs::read_to_string("out/project_structure.md")?;
    let stats = build_project(&config, &markdown)?;

    stats.print_summary();
    Ok(())
}

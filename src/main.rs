use anyhow::Context;
use clap::{Parser, Subcommand};
use llm_forge::{extract, Config, Materializer, ReportWriter, Workflow};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "llm-forge",
    version,
    author,
    about = "Generate project skeletons and code from natural-language requirements",
    long_about = "Generate project skeletons, architecture descriptions and source files \
    from natural-language requirements through chained LLM prompts.\n\n\
    The tool talks to an OpenAI-compatible chat-completions endpoint and works in \
    three modes: a three-stage workflow producing Markdown reports, a one-shot \
    project-structure generator, and a builder that materializes the files a \
    structure document describes.\n\n\
    USAGE EXAMPLES:\n  \
      # Run the full three-stage workflow\n  \
      llm-forge workflow \"a todo manager with due dates\"\n\n  \
      # Generate a structure document, then build the project from it\n  \
      llm-forge scaffold \"a FastAPI blog system\"\n  \
      llm-forge build out/project_structure.md --project-dir ./blog"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API key for the model endpoint
    #[arg(long, env = "LLM_FORGE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible chat-completions endpoint
    #[arg(long, env = "LLM_FORGE_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Model identifier requested from the endpoint
    #[arg(long, global = true)]
    model: Option<String>,

    /// Output directory for reports and structure documents
    #[arg(short, long, default_value = "out", global = true)]
    out: PathBuf,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the three-stage workflow (analysis -> design -> implementation)
    Workflow {
        /// Natural-language software requirement
        requirement: String,

        /// Base name for the generated report files
        #[arg(long, default_value = "workflow_result")]
        base_name: String,
    },

    /// Generate a project-structure document for a requirement
    Scaffold {
        /// Natural-language software requirement
        requirement: String,

        /// Filename for the structure document, inside the output directory
        #[arg(long, default_value = "project_structure.md")]
        file: String,
    },

    /// Generate project files from a structure document
    Build {
        /// Path to the structure Markdown document
        structure: PathBuf,

        /// Directory the generated project is written into
        #[arg(long, default_value = "generated_project")]
        project_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let mut builder = Config::builder().output_dir(&cli.out);
    if let Some(key) = cli.api_key.clone() {
        builder = builder.api_key(key);
    }
    if let Some(url) = cli.base_url.clone() {
        builder = builder.base_url(url);
    }
    if let Some(model) = cli.model.clone() {
        builder = builder.model(model);
    }
    if let Command::Build { project_dir, .. } = &cli.command {
        builder = builder.project_dir(project_dir);
    }

    let config = builder.build().context("Failed to build configuration")?;

    match cli.command {
        Command::Workflow {
            requirement,
            base_name,
        } => run_workflow_command(&config, &requirement, &base_name),
        Command::Scaffold { requirement, file } => {
            run_scaffold_command(&config, &requirement, &file)
        }
        Command::Build { structure, .. } => run_build_command(&config, &structure),
    }
}

fn run_workflow_command(config: &Config, requirement: &str, base_name: &str) -> anyhow::Result<()> {
    let workflow = Workflow::new(config).context("Failed to initialize workflow")?;
    let result = workflow.run(requirement);

    let reports = ReportWriter::new(&config.output_dir, base_name)
        .write(requirement, &result)
        .context("Failed to write workflow reports")?;

    for path in &reports.stage_files {
        println!("wrote {}", path.display());
    }
    println!("wrote {}", reports.summary.display());

    if let Some(failure) = &result.failure {
        eprintln!(
            "workflow halted at {}: {}",
            failure.stage.name(),
            failure.error
        );
    }

    Ok(())
}

fn run_scaffold_command(config: &Config, requirement: &str, file: &str) -> anyhow::Result<()> {
    let workflow = Workflow::new(config).context("Failed to initialize workflow")?;
    let document = workflow
        .scaffold(requirement)
        .context("Failed to generate the project structure")?;

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            config.output_dir.display()
        )
    })?;

    let path = config.output_dir.join(file);
    fs::write(&path, &document)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;

    println!("wrote {}", path.display());
    Ok(())
}

fn run_build_command(config: &Config, structure: &Path) -> anyhow::Result<()> {
    let markdown = fs::read_to_string(structure)
        .with_context(|| format!("Failed to read '{}'", structure.display()))?;

    let entries =
        extract::extract_entries(&markdown).context("Failed to extract the project structure")?;
    println!("extracted {} files to generate", entries.len());

    let stats = Materializer::new(config)
        .context("Failed to initialize materializer")?
        .materialize(&entries)
        .context("Failed to materialize the project")?;

    stats.print_summary();
    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("llm_forge=info"),
        1 => EnvFilter::new("llm_forge=debug"),
        _ => EnvFilter::new("llm_forge=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .init();

    Ok(())
}

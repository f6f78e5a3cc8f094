//! Turns extracted file entries into files on disk.
//!
//! Materialization is best-effort per file: a failed model call substitutes
//! fixed stub content and the batch carries on. Files are written grouped by
//! kind in a fixed priority order so later files are more likely to reference
//! symbols that already exist; no actual dependency graph is built or
//! verified.

use crate::client::{ModelClient, SamplingParams, TextGenerator};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{FileKind, ProjectFileEntry};
use crate::template::TemplateEngine;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Processing order across kinds: dependencies and configuration first,
/// then data layers, then routes and entry points, tests and the rest last.
const PRIORITY_ORDER: [FileKind; 12] = [
    FileKind::Requirements,
    FileKind::Config,
    FileKind::Database,
    FileKind::Model,
    FileKind::Schema,
    FileKind::Service,
    FileKind::Router,
    FileKind::Main,
    FileKind::Test,
    FileKind::Migration,
    FileKind::Docker,
    FileKind::Util,
];

const STUB_PACKAGE_INIT: &str = "\"\"\"Package initialization file.\"\"\"\n";

const STUB_REQUIREMENTS: &str = "fastapi==0.104.1
uvicorn==0.24.0
sqlalchemy==2.0.23
pydantic==2.5.0
python-multipart==0.0.6
python-jose==3.3.0
passlib==1.7.4
alembic==1.13.0
pytest==7.4.3
httpx==0.25.2
";

const STUB_DOCKERFILE: &str = "FROM python:3.11-slim

WORKDIR /app

COPY requirements.txt .
RUN pip install -r requirements.txt

COPY . .

CMD [\"uvicorn\", \"app.main:app\", \"--host\", \"0.0.0.0\", \"--port\", \"8000\"]
";

/// Statistics collected during one materialization run.
#[derive(Debug, Clone, Serialize)]
pub struct MaterializeStats {
    /// Number of entries requested
    pub files_requested: usize,

    /// Number of files written to disk
    pub files_written: usize,

    /// Number of files that received stub content after a failed model call
    pub stubs_substituted: usize,

    /// Number of entries that could not be written at all
    pub write_failures: usize,

    /// Total execution time
    pub duration: Duration,

    /// Directory the project was written into
    pub output_directory: String,
}

impl MaterializeStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║            Project Materialization Summary            ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Files Requested:      {:>8}                        ║",
            self.files_requested
        );
        println!(
            "║ Files Written:        {:>8}                        ║",
            self.files_written
        );
        println!(
            "║ Stubs Substituted:    {:>8}                        ║",
            self.stubs_substituted
        );
        println!(
            "║ Write Failures:       {:>8}                        ║",
            self.write_failures
        );
        println!(
            "║ Duration:             {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("║ Output Directory:                                     ║");
        println!(
            "║   {}                                              ║",
            self.output_directory
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Writes extracted project entries to disk via the model client.
pub struct Materializer {
    generator: Box<dyn TextGenerator>,
    engine: TemplateEngine,
    project_dir: PathBuf,
    params: SamplingParams,
}

impl Materializer {
    /// Creates a materializer backed by a [`ModelClient`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or engine setup fails.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_generator(Box::new(ModelClient::new(config)?), &config.project_dir)
    }

    /// Creates a materializer over an arbitrary text generator.
    ///
    /// # Errors
    ///
    /// Returns an error if template registration fails.
    pub fn with_generator(
        generator: Box<dyn TextGenerator>,
        project_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            generator,
            engine: TemplateEngine::new()?,
            project_dir: project_dir.into(),
            params: SamplingParams::default(),
        })
    }

    /// Generates and writes every entry, grouped by kind priority.
    ///
    /// Already-written files are not rolled back when a later entry fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if the project directory itself cannot be
    /// created; per-entry failures degrade to stubs or are skipped with a
    /// warning.
    pub fn materialize(&self, entries: &[ProjectFileEntry]) -> Result<MaterializeStats> {
        let start = Instant::now();

        fs::create_dir_all(&self.project_dir).map_err(|e| Error::io(&self.project_dir, e))?;

        let mut by_kind: HashMap<FileKind, Vec<&ProjectFileEntry>> = HashMap::new();
        for entry in entries {
            by_kind.entry(entry.kind).or_default().push(entry);
        }

        info!(
            "materializing {} files into {}",
            entries.len(),
            self.project_dir.display()
        );

        let mut files_written = 0;
        let mut stubs_substituted = 0;
        let mut write_failures = 0;

        for kind in PRIORITY_ORDER {
            let Some(group) = by_kind.get(&kind) else {
                continue;
            };
            debug!(kind = kind.id(), count = group.len(), "processing group");

            for entry in group {
                let content = match self.generate_content(entry) {
                    Ok(content) => content,
                    Err(error) => {
                        warn!(path = %entry.path, %error, "falling back to stub content");
                        stubs_substituted += 1;
                        stub_content(entry)
                    }
                };

                match self.write_file(&entry.path, &content) {
                    Ok(()) => {
                        files_written += 1;
                        debug!(path = %entry.path, "wrote file");
                    }
                    Err(error) => {
                        warn!(path = %entry.path, %error, "failed to write file");
                        write_failures += 1;
                    }
                }
            }
        }

        let stats = MaterializeStats {
            files_requested: entries.len(),
            files_written,
            stubs_substituted,
            write_failures,
            duration: start.elapsed(),
            output_directory: self.project_dir.display().to_string(),
        };

        info!(
            "materialization finished: {}/{} files written, {} stubbed",
            stats.files_written, stats.files_requested, stats.stubs_substituted
        );

        Ok(stats)
    }

    /// Renders the kind-specific prompt and calls the generator.
    fn generate_content(&self, entry: &ProjectFileEntry) -> Result<String> {
        let prompt = self.engine.render_file_prompt(entry)?;
        self.generator
            .generate(&prompt, &self.params)
            .map_err(|e| Error::generation(&entry.path, e))
    }

    /// Writes one file below the project directory, creating parents and
    /// silently overwriting an existing file.
    fn write_file(&self, relative: &str, content: &str) -> Result<()> {
        if relative.split('/').any(|segment| segment == "..") {
            return Err(Error::config(format!(
                "refusing path escaping the project directory: '{relative}'"
            )));
        }

        let target = self.project_dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let temp_path = target.with_extension("tmp");
        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
        drop(temp_file);

        fs::rename(&temp_path, &target).map_err(|e| Error::io(&target, e))?;

        Ok(())
    }
}

/// Fixed fallback content used when generation fails. Never empty.
fn stub_content(entry: &ProjectFileEntry) -> String {
    if entry.path.ends_with("__init__.py") {
        return STUB_PACKAGE_INIT.to_string();
    }

    match entry.kind {
        FileKind::Requirements => STUB_REQUIREMENTS.to_string(),
        FileKind::Docker => STUB_DOCKERFILE.to_string(),
        _ => format!("# {}\n# generation failed, fill in manually\n", entry.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn entry(path: &str) -> ProjectFileEntry {
        ProjectFileEntry {
            path: path.to_string(),
            kind: crate::extract::classify(path),
            description: String::new(),
            declared_symbols: Vec::new(),
        }
    }

    struct EchoGenerator {
        generated_paths: Rc<RefCell<Vec<String>>>,
    }

    impl TextGenerator for EchoGenerator {
        fn generate(&self, prompt: &str, _params: &SamplingParams) -> Result<String> {
            // The rendered prompt names the target path on its own line.
            let path = prompt
                .lines()
                .find_map(|line| line.strip_prefix("File path: "))
                .unwrap_or("unknown")
                .to_string();
            self.generated_paths.borrow_mut().push(path.clone());
            Ok(format!("# generated content for {path}\n"))
        }
    }

    struct AlwaysFailingGenerator;

    impl TextGenerator for AlwaysFailingGenerator {
        fn generate(&self, _prompt: &str, _params: &SamplingParams) -> Result<String> {
            Err(Error::http("backend unavailable"))
        }
    }

    fn echo_materializer(project_dir: &std::path::Path) -> (Materializer, Rc<RefCell<Vec<String>>>) {
        let generated_paths = Rc::new(RefCell::new(Vec::new()));
        let generator = EchoGenerator {
            generated_paths: Rc::clone(&generated_paths),
        };
        (
            Materializer::with_generator(Box::new(generator), project_dir).unwrap(),
            generated_paths,
        )
    }

    #[test]
    fn writes_generated_content_to_disk() {
        let temp = assert_fs::TempDir::new().unwrap();
        let (materializer, _) = echo_materializer(temp.path());

        let entries = vec![entry("app/main.py"), entry("app/routers/posts.py")];
        let stats = materializer.materialize(&entries).unwrap();

        assert_eq!(stats.files_written, 2);
        assert_eq!(stats.stubs_substituted, 0);

        let main = std::fs::read_to_string(temp.path().join("app/main.py")).unwrap();
        assert!(main.contains("generated content for app/main.py"));
        assert!(temp.path().join("app/routers/posts.py").exists());
    }

    #[test]
    fn failing_client_still_yields_non_empty_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        let materializer =
            Materializer::with_generator(Box::new(AlwaysFailingGenerator), temp.path()).unwrap();

        let entries = vec![
            entry("requirements.txt"),
            entry("Dockerfile"),
            entry("app/__init__.py"),
            entry("app/services/post_service.py"),
        ];
        let stats = materializer.materialize(&entries).unwrap();

        assert_eq!(stats.files_written, 4);
        assert_eq!(stats.stubs_substituted, 4);

        for e in &entries {
            let written = std::fs::read_to_string(temp.path().join(&e.path)).unwrap();
            assert!(!written.is_empty(), "empty file for {}", e.path);
        }

        // Type-specific stubs.
        let requirements = std::fs::read_to_string(temp.path().join("requirements.txt")).unwrap();
        assert!(requirements.contains("fastapi=="));
        let dockerfile = std::fs::read_to_string(temp.path().join("Dockerfile")).unwrap();
        assert!(dockerfile.starts_with("FROM python:3.11-slim"));
        let package_init = std::fs::read_to_string(temp.path().join("app/__init__.py")).unwrap();
        assert!(package_init.contains("Package initialization file"));
    }

    #[test]
    fn entries_are_processed_in_priority_order() {
        let temp = assert_fs::TempDir::new().unwrap();
        let (materializer, generated_paths) = echo_materializer(temp.path());

        // Deliberately unordered input.
        let entries = vec![
            entry("tests/test_posts.py"),
            entry("app/main.py"),
            entry("requirements.txt"),
            entry("app/models/post.py"),
        ];
        materializer.materialize(&entries).unwrap();

        let order = generated_paths.borrow();
        assert_eq!(
            *order,
            vec![
                "requirements.txt",
                "app/models/post.py",
                "app/main.py",
                "tests/test_posts.py",
            ]
        );
    }

    #[test]
    fn existing_files_are_overwritten_silently() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("app/main.py").write_str("old content").unwrap();

        let (materializer, _) = echo_materializer(temp.path());
        materializer.materialize(&[entry("app/main.py")]).unwrap();

        let written = std::fs::read_to_string(temp.path().join("app/main.py")).unwrap();
        assert!(written.contains("generated content"));
        assert!(!written.contains("old content"));
    }

    #[test]
    fn escaping_paths_are_rejected_without_aborting_the_batch() {
        let temp = assert_fs::TempDir::new().unwrap();
        let (materializer, _) = echo_materializer(temp.path());

        let entries = vec![entry("../escape.py"), entry("app/main.py")];
        let stats = materializer.materialize(&entries).unwrap();

        assert_eq!(stats.write_failures, 1);
        assert_eq!(stats.files_written, 1);
        assert!(!temp.path().parent().unwrap().join("escape.py").exists());
    }
}

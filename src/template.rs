use crate::error::{Error, Result};
use crate::extract::{FileKind, ProjectFileEntry};
use tera::{Context, Tera};

/// Placeholder text used when a file declares no symbols.
const NO_SYMBOLS: &str = "no specific symbols declared";

/// Stage prompt templates, registered under their workflow names.
const STAGE_TEMPLATES: &[(&str, &str)] = &[
    (
        "requirement_analysis",
        include_str!("../templates/requirement_analysis.tera"),
    ),
    (
        "architecture_design",
        include_str!("../templates/architecture_design.tera"),
    ),
    (
        "code_implementation",
        include_str!("../templates/code_implementation.tera"),
    ),
    ("skeleton", include_str!("../templates/skeleton.tera")),
];

/// Per-file-kind prompt templates, registered under [`FileKind::template_name`].
const FILE_TEMPLATES: &[(&str, &str)] = &[
    ("router", include_str!("../templates/router.tera")),
    ("model", include_str!("../templates/model.tera")),
    ("schema", include_str!("../templates/schema.tera")),
    ("service", include_str!("../templates/service.tera")),
    ("config", include_str!("../templates/config.tera")),
    ("test", include_str!("../templates/test.tera")),
    ("migration", include_str!("../templates/migration.tera")),
    ("database", include_str!("../templates/database.tera")),
    ("util", include_str!("../templates/util.tera")),
    ("main", include_str!("../templates/main.tera")),
    ("docker", include_str!("../templates/docker.tera")),
    (
        "requirements",
        include_str!("../templates/requirements.tera"),
    ),
];

/// Template engine holding the built-in prompt templates.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Creates a new engine with all built-in templates registered.
    ///
    /// # Errors
    ///
    /// Returns an error if template registration fails.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        for (name, source) in STAGE_TEMPLATES.iter().chain(FILE_TEMPLATES) {
            tera.add_raw_template(name, source)
                .map_err(|e| Error::template(*name, e))?;
        }

        Ok(Self { tera })
    }

    /// Renders a registered template with the given context.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the template is unknown.
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(name, context)
            .map_err(|e| Error::template(name, e))
    }

    /// Renders a single-variable template.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render_input(&self, name: &str, variable: &str, value: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert(variable, value);
        self.render(name, &context)
    }

    /// Renders the generation prompt for one project file entry.
    ///
    /// Falls back to the `util` template should the entry's kind ever lack a
    /// registered template.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render_file_prompt(&self, entry: &ProjectFileEntry) -> Result<String> {
        let name = entry.kind.template_name();
        let name = if self.tera.get_template_names().any(|n| n == name) {
            name
        } else {
            FileKind::Util.template_name()
        };

        let functions = if entry.declared_symbols.is_empty() {
            NO_SYMBOLS.to_string()
        } else {
            entry.declared_symbols.join(", ")
        };

        let mut context = Context::new();
        context.insert("file_path", &entry.path);
        context.insert("description", &entry.description);
        context.insert("functions", &functions);

        self.render(name, &context)
    }
}

//! Recovers a generatable file list from a Markdown structure document.
//!
//! The input is free-form model output expected to contain one fenced block
//! with a tree drawing of the project layout, plus optional ``### `path` ``
//! sections describing individual files. Extraction is best-effort text
//! scraping: a missing tree is fatal, everything else degrades to empty
//! fields.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Box-drawing glyphs used by tree renderings.
const TREE_GLYPHS: [char; 4] = ['│', '├', '└', '─'];

/// Tab stops count as this many columns when measuring tree indentation.
const TAB_WIDTH: usize = 4;

static GENERATE_EXTENSIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["py", "txt", "md", "ini", "mako"].into_iter().collect());

static SPECIAL_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["Dockerfile", "README.md", "requirements.txt", "alembic.ini"]
        .into_iter()
        .collect()
});

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"###\s*`([^`\n]+)`").expect("valid heading regex"));

static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"- \*\*(?:Function|Class)\*\*: `([^`\n]+)`").expect("valid symbol regex")
});

/// Category a project file is generated as.
///
/// Classification is a total function of the path: every path maps to
/// exactly one kind, with [`FileKind::Util`] as the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    /// API route definitions
    Router,
    /// ORM data models
    Model,
    /// Validation/serialization schemas
    Schema,
    /// Business logic services
    Service,
    /// Application configuration
    Config,
    /// Test files
    Test,
    /// Database migrations
    Migration,
    /// Database connection and session management
    Database,
    /// Utility helpers (also the default category)
    Util,
    /// Application entry points
    Main,
    /// Container build recipes
    Docker,
    /// Dependency manifests
    Requirements,
}

/// Keyword table for path classification, checked in order; first match wins.
const KIND_KEYWORDS: &[(FileKind, &[&str])] = &[
    (FileKind::Router, &["router", "api", "endpoint"]),
    (FileKind::Model, &["model"]),
    (FileKind::Schema, &["schema", "pydantic", "dto"]),
    (FileKind::Service, &["service", "business", "logic"]),
    (FileKind::Config, &["config", "setting", "env"]),
    (FileKind::Test, &["test", "spec"]),
    (FileKind::Migration, &["migration", "alembic", "versions"]),
    (FileKind::Database, &["database", "db", "session"]),
    (FileKind::Util, &["util", "helper", "common"]),
    (FileKind::Main, &["main", "app"]),
    (FileKind::Docker, &["dockerfile"]),
    (FileKind::Requirements, &["requirements"]),
];

impl FileKind {
    /// Returns the ID string for this kind.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Model => "model",
            Self::Schema => "schema",
            Self::Service => "service",
            Self::Config => "config",
            Self::Test => "test",
            Self::Migration => "migration",
            Self::Database => "database",
            Self::Util => "util",
            Self::Main => "main",
            Self::Docker => "docker",
            Self::Requirements => "requirements",
        }
    }

    /// Returns the prompt template name for this kind.
    ///
    /// Template names coincide with [`FileKind::id`]; kept separate so the
    /// template registry can diverge without touching classification.
    #[must_use]
    pub const fn template_name(self) -> &'static str {
        self.id()
    }

    /// Returns all kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Router,
            Self::Model,
            Self::Schema,
            Self::Service,
            Self::Config,
            Self::Test,
            Self::Migration,
            Self::Database,
            Self::Util,
            Self::Main,
            Self::Docker,
            Self::Requirements,
        ]
    }
}

/// One file recovered from a structure document.
///
/// Immutable after extraction; consumed once by the materializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFileEntry {
    /// Relative path within the generated project
    pub path: String,

    /// Category the file is generated as
    pub kind: FileKind,

    /// Prose description scraped from the document, empty if absent
    pub description: String,

    /// Function/class names declared for this file, in appearance order
    pub declared_symbols: Vec<String>,
}

/// Extracts the generatable file entries from a structure document.
///
/// # Errors
///
/// Returns [`Error::Extraction`] if the document contains no fenced tree
/// block. Missing descriptions or symbol declarations are not errors; the
/// corresponding fields are left empty.
pub fn extract_entries(markdown: &str) -> Result<Vec<ProjectFileEntry>> {
    let tree = fenced_tree_block(markdown)?;
    let descriptions = parse_descriptions(markdown);

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for path in tree_paths(tree) {
        if !should_materialize(&path) {
            debug!(path = %path, "skipping non-generatable entry");
            continue;
        }
        if !seen.insert(path.clone()) {
            debug!(path = %path, "skipping duplicate entry");
            continue;
        }

        let description = descriptions.get(&path).cloned().unwrap_or_default();
        let declared_symbols = declared_symbols(&description);

        entries.push(ProjectFileEntry {
            kind: classify(&path),
            path,
            description,
            declared_symbols,
        });
    }

    Ok(entries)
}

/// Classifies a path into its file kind.
///
/// Exact filenames take precedence over keyword matches, so a `Dockerfile`
/// inside a `services/` directory still classifies as [`FileKind::Docker`].
#[must_use]
pub fn classify(path: &str) -> FileKind {
    let lower = path.to_lowercase();
    let name = lower.rsplit('/').next().unwrap_or(&lower);

    match name {
        "dockerfile" => return FileKind::Docker,
        "requirements.txt" => return FileKind::Requirements,
        "readme.md" => return FileKind::Util,
        "alembic.ini" => return FileKind::Migration,
        _ => {}
    }

    for (kind, keywords) in KIND_KEYWORDS {
        if keywords.iter().any(|keyword| lower.contains(keyword)) {
            return *kind;
        }
    }

    FileKind::Util
}

/// Finds the first fenced block, preferring one with no language tag.
fn fenced_tree_block(markdown: &str) -> Result<&str> {
    let mut first_any: Option<&str> = None;
    let mut open: Option<(usize, bool)> = None; // (content start, plain tag)
    let mut offset = 0;

    for raw_line in markdown.split_inclusive('\n') {
        let line = raw_line.trim_end_matches(['\r', '\n']);

        if let Some(info) = line.trim_start().strip_prefix("```") {
            match open.take() {
                None => {
                    let plain = info.trim().is_empty();
                    open = Some((offset + raw_line.len(), plain));
                }
                Some((start, plain)) => {
                    let content = markdown[start..offset].trim_end_matches(['\r', '\n']);
                    if plain {
                        return Ok(content);
                    }
                    first_any.get_or_insert(content);
                }
            }
        }

        offset += raw_line.len();
    }

    first_any.ok_or_else(|| Error::extraction("no directory tree found in document"))
}

/// Reconstructs file paths from the tree drawing.
///
/// Nesting is tracked as a stack of observed indentation-prefix widths
/// rather than a fixed divide-by-4, so irregular indentation keeps ancestry
/// consistent with whatever widths the generator actually produced.
fn tree_paths(tree: &str) -> Vec<String> {
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut files = Vec::new();

    for line in tree.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let (width, rest) = split_prefix(line);
        let name = bare_name(rest);
        if name.is_empty() {
            continue;
        }

        while stack.last().is_some_and(|(w, _)| *w >= width) {
            stack.pop();
        }

        if let Some(dir) = name.strip_suffix('/') {
            stack.push((width, dir.to_string()));
        } else if stack.is_empty() {
            files.push(name);
        } else {
            let mut path = stack
                .iter()
                .map(|(_, segment)| segment.as_str())
                .collect::<Vec<_>>()
                .join("/");
            path.push('/');
            path.push_str(&name);
            files.push(path);
        }
    }

    files
}

/// Measures the column width of the leading glyph/whitespace run and returns
/// the remainder of the line.
fn split_prefix(line: &str) -> (usize, &str) {
    let mut width = 0;

    for (index, ch) in line.char_indices() {
        match ch {
            '\t' => width += TAB_WIDTH,
            ' ' => width += 1,
            _ if TREE_GLYPHS.contains(&ch) => width += 1,
            _ => return (width, &line[index..]),
        }
    }

    (width, "")
}

/// Recovers the bare file or directory name, dropping inline comments.
fn bare_name(rest: &str) -> String {
    rest.split('#').next().unwrap_or("").trim().to_string()
}

/// Decides whether an extracted path names a generatable file.
///
/// Extensionless single-segment paths are taken as stray root directory
/// names (tree generators occasionally emit the project name without a
/// trailing slash) and skipped.
fn should_materialize(path: &str) -> bool {
    if path.is_empty() || path.ends_with('/') {
        return false;
    }

    let name = path.rsplit('/').next().unwrap_or(path);
    if SPECIAL_NAMES.contains(name) {
        return true;
    }

    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => GENERATE_EXTENSIONS.contains(ext),
        _ => path.contains('/'),
    }
}

/// Maps ``### `path` `` headings to the text that follows them.
fn parse_descriptions(markdown: &str) -> HashMap<String, String> {
    let matches: Vec<_> = HEADING_RE.captures_iter(markdown).collect();
    let mut descriptions = HashMap::new();

    for (index, capture) in matches.iter().enumerate() {
        let path = capture[1].trim().to_string();
        let start = capture.get(0).map_or(0, |m| m.end());
        let end = matches
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map_or(markdown.len(), |m| m.start());

        descriptions
            .entry(path)
            .or_insert_with(|| markdown[start..end].trim().to_string());
    }

    descriptions
}

/// Collects declared function/class names from a description block.
fn declared_symbols(description: &str) -> Vec<String> {
    SYMBOL_RE
        .captures_iter(description)
        .map(|capture| capture[1].to_string())
        .collect()
}

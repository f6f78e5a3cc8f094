use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the llm-forge library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// The structure document could not be parsed.
    ///
    /// Fatal for the whole extraction pass: no partial entry list is produced.
    #[error("Failed to extract project structure: {message}")]
    Extraction {
        /// What was missing or malformed
        message: String,
    },

    /// Content generation failed for a single file.
    ///
    /// Non-fatal: the materializer substitutes stub content and continues.
    #[error("Failed to generate content for '{path}': {message}")]
    Generation {
        /// Target file path within the project
        path: String,
        /// Error message
        message: String,
    },

    /// One stage of the chained workflow failed.
    ///
    /// Halts the workflow; outputs collected so far are still returned.
    #[error("Workflow stage '{stage}' failed: {message}")]
    Stage {
        /// Stage name
        stage: String,
        /// Error message
        message: String,
    },

    /// Transport or protocol failure talking to the model endpoint.
    #[error("Model API request failed: {message}")]
    Http {
        /// Error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: tera::Error) -> Self {
        Self::Template {
            template: template.into(),
            message: source.to_string(),
        }
    }

    /// Creates an extraction error.
    #[must_use]
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Creates a generation error for a single project file.
    #[must_use]
    pub fn generation(path: impl Into<String>, source: Self) -> Self {
        Self::Generation {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a workflow stage error.
    #[must_use]
    pub fn stage(stage: impl Into<String>, source: Self) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: source.to_string(),
        }
    }

    /// Creates an HTTP error.
    #[must_use]
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Returns true if this is an extraction error.
    #[must_use]
    pub const fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }

    /// Returns true if this is a workflow stage error.
    #[must_use]
    pub const fn is_stage(&self) -> bool {
        matches!(self, Self::Stage { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

// Conversion implementations for convenient error handling
impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        Self::Template {
            template: "unknown".to_string(),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Http {
            message: e.to_string(),
        }
    }
}

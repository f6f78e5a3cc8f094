use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn/v1";
const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-Coder-7B-Instruct";
const DEFAULT_OUTPUT_DIR: &str = "out";
const DEFAULT_PROJECT_DIR: &str = "generated_project";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Placeholder credential used when no API key is supplied.
///
/// Kept obviously fake so a missing key fails at the remote endpoint with a
/// clear auth error instead of silently reusing someone's real secret.
pub const PLACEHOLDER_API_KEY: &str = "sk-0000000000000000000000000000000000000000000000000";

/// Environment variable holding the model API key.
pub const API_KEY_ENV: &str = "LLM_FORGE_API_KEY";

/// Environment variable overriding the model endpoint base URL.
pub const BASE_URL_ENV: &str = "LLM_FORGE_BASE_URL";

/// Configuration for the llm-forge pipeline.
///
/// Use [`Config::builder()`] to construct a new configuration. The
/// configuration is an explicit, passed-down value: there is no process-wide
/// singleton, so two configs with different credentials can coexist.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// API key sent as a bearer token to the model endpoint
    pub api_key: String,

    /// Base URL of the OpenAI-compatible chat-completions service
    pub base_url: String,

    /// Model identifier requested from the service
    pub model: String,

    /// Output directory for workflow reports and structure documents
    pub output_dir: PathBuf,

    /// Directory the materializer writes generated project files into
    pub project_dir: PathBuf,

    /// Per-request timeout for model calls
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_forge::Config;
    ///
    /// let config = Config::builder()
    ///     .api_key("sk-test")
    ///     .output_dir("./out")
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Creates a configuration from the environment.
    ///
    /// Reads [`API_KEY_ENV`] and [`BASE_URL_ENV`], falling back to the
    /// placeholder key and the default endpoint when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            builder = builder.base_url(url);
        }

        builder.build()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The API key is empty
    /// - The base URL is empty or not an HTTP(S) URL
    /// - The model name is empty
    /// - The request timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config("api_key must not be empty"));
        }

        if self.api_key == PLACEHOLDER_API_KEY {
            tracing::warn!(
                "using the placeholder API key; set {} to call a real endpoint",
                API_KEY_ENV
            );
        }

        if self.base_url.trim().is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::config(format!(
                "base_url must be an HTTP(S) URL, got '{}'",
                self.base_url
            )));
        }

        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::config("request_timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Returns the chat-completions endpoint URL for this configuration.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: PLACEHOLDER_API_KEY.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            project_dir: PathBuf::from(DEFAULT_PROJECT_DIR),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    output_dir: Option<PathBuf>,
    project_dir: Option<PathBuf>,
    request_timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the endpoint base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the output directory for reports and structure documents.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the directory generated project files are written into.
    #[must_use]
    pub fn project_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(path.into());
        self
    }

    /// Sets the per-request timeout for model calls.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();

        let config = Config {
            api_key: self.api_key.unwrap_or(defaults.api_key),
            base_url: self.base_url.unwrap_or(defaults.base_url),
            model: self.model.unwrap_or(defaults.model),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            project_dir: self.project_dir.unwrap_or(defaults.project_dir),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::builder().build().unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_key, PLACEHOLDER_API_KEY);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = Config::builder().api_key("  ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = Config::builder().base_url("ftp://example.com").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Config::builder()
            .request_timeout(Duration::from_secs(0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_completions_url_strips_trailing_slash() {
        let config = Config::builder()
            .base_url("https://api.example.com/v1/")
            .build()
            .unwrap();

        assert_eq!(
            config.completions_url(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_two_configs_do_not_share_state() {
        let a = Config::builder().api_key("sk-first").build().unwrap();
        let b = Config::builder().api_key("sk-second").build().unwrap();

        assert_eq!(a.api_key, "sk-first");
        assert_eq!(b.api_key, "sk-second");
    }
}

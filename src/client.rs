//! OpenAI-compatible chat-completions client.
//!
//! The remote service is treated as opaque: retries, rate limiting and auth
//! are its concern and surface here only as [`Error::Http`].

use crate::config::Config;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 3_000;

/// Sampling parameters sent with a single completion request.
#[derive(Debug, Clone)]
pub struct SamplingParams {
    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens the model may generate
    pub max_tokens: u32,

    /// Penalty on token frequency, used to suppress repetition
    pub frequency_penalty: f32,

    /// Penalty on token presence
    pub presence_penalty: f32,

    /// Stop sequences that end generation early
    pub stop: Vec<String>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: Vec::new(),
        }
    }
}

/// Trait for text generation backends.
///
/// [`ModelClient`] is the production implementation; tests substitute
/// scripted or failing generators at this seam.
pub trait TextGenerator {
    /// Generates text for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to produce text.
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String>;
}

/// Request body for the chat-completions endpoint.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<&'a str>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from the chat-completions endpoint.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Blocking client for an OpenAI-compatible chat-completions service.
///
/// Holds connection configuration only; every call is a synchronous,
/// blocking request and no two calls overlap within one thread of use.
pub struct ModelClient {
    http: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl ModelClient {
    /// Creates a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the underlying
    /// HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let http = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint: config.completions_url(),
            model: config.model.clone(),
        })
    }

    /// Returns the endpoint URL this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TextGenerator for ModelClient {
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            stop: params.stop.iter().map(String::as_str).collect(),
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_chars = prompt.len(),
            "sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::http(format!("endpoint returned {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| Error::http(format!("malformed completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::http("completion response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> Config {
        Config::builder()
            .api_key("sk-test")
            .base_url(base_url)
            .build()
            .unwrap()
    }

    #[test]
    fn request_body_carries_sampling_params() {
        // Values chosen to be exactly representable in both f32 and f64.
        let request = ChatRequest {
            model: "test-model",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.5,
            max_tokens: 500,
            frequency_penalty: 0.25,
            presence_penalty: 0.75,
            stop: vec!["\n\n"],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["temperature"], 0.5);
        assert_eq!(value["frequency_penalty"], 0.25);
        assert_eq!(value["presence_penalty"], 0.75);
        assert_eq!(value["max_tokens"], 500);
        assert_eq!(value["stop"][0], "\n\n");
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn empty_stop_list_is_omitted_from_request() {
        let request = ChatRequest {
            model: "m",
            messages: vec![],
            temperature: 0.1,
            max_tokens: 10,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: vec![],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("stop").is_none());
    }

    #[test]
    fn response_parsing_takes_first_choice() {
        let body = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        });

        let parsed: ChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "first");
    }

    #[test]
    fn generate_returns_completion_text() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());

        rt.block_on(
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .and(header("authorization", "Bearer sk-test"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "analysis text"}}]
                })))
                .mount(&server),
        );

        let client = ModelClient::new(&test_config(&server.uri())).unwrap();
        let out = client
            .generate("analyze this", &SamplingParams::default())
            .unwrap();

        assert_eq!(out, "analysis text");
    }

    #[test]
    fn generate_surfaces_server_errors() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());

        rt.block_on(
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
                .mount(&server),
        );

        let client = ModelClient::new(&test_config(&server.uri())).unwrap();
        let err = client
            .generate("prompt", &SamplingParams::default())
            .unwrap_err();

        let rendered = err.to_string();
        assert!(rendered.contains("500"));
        assert!(rendered.contains("backend down"));
    }

    #[test]
    fn generate_rejects_empty_choice_list() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());

        rt.block_on(
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })),
                )
                .mount(&server),
        );

        let client = ModelClient::new(&test_config(&server.uri())).unwrap();
        let err = client
            .generate("prompt", &SamplingParams::default())
            .unwrap_err();

        assert!(err.to_string().contains("no choices"));
    }
}

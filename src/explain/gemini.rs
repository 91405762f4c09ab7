//! Gemini API key provider (Generative Language API).

use super::{ExplainError, Explainer, Explanation, build_prompt};
use crate::config::ExplainConfig;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const USER_AGENT: &str = concat!("novacalc/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    /// Models sometimes wrap JSON in a Markdown fence despite the MIME type.
    static ref CODE_FENCE: Regex = Regex::new(
        r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$"
    ).unwrap();
}

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` means every request fails with [`ExplainError::MissingApiKey`].
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Build from the `[explain]` config section and the environment.
    ///
    /// API key: `api_key` from config, then `GEMINI_API_KEY`.
    /// Base URL: `GEMINI_BASE_URL`, then config, then the public endpoint.
    pub fn from_settings(settings: &ExplainConfig) -> Self {
        let api_key = resolve_api_key(settings.api_key.as_deref(), "GEMINI_API_KEY");
        let base_url = std::env::var("GEMINI_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| settings.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

fn resolve_api_key(config_api_key: Option<&str>, env_var: &str) -> Option<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    std::env::var(env_var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: GeminiConfig) -> Result<Self, ExplainError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn request(&self, expression: &str, result: &str) -> Result<Explanation, ExplainError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ExplainError::MissingApiKey)?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let request = build_request(&build_prompt(expression, result));
        debug!(model = %self.config.model, expression, "Requesting explanation");

        let response = self
            .http
            .post(&url)
            .headers(build_headers(api_key)?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExplainError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)?;
        parse_response(&value)
    }
}

impl Explainer for GeminiClient {
    async fn explain(&self, expression: &str, result: &str) -> Result<Explanation, ExplainError> {
        self.request(expression, result).await
    }
}

fn build_request(prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "stepByStep": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "List of steps to reach the result"
                    },
                    "concept": {
                        "type": "STRING",
                        "description": "The mathematical concept involved"
                    },
                    "realWorldUsage": {
                        "type": "STRING",
                        "description": "Where this math is used in the real world"
                    }
                },
                "required": ["stepByStep", "concept", "realWorldUsage"],
                "propertyOrdering": ["stepByStep", "concept", "realWorldUsage"]
            }
        }
    })
}

/// Pull the explanation out of a `generateContent` response body.
fn parse_response(value: &Value) -> Result<Explanation, ExplainError> {
    let parts = value
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .ok_or_else(|| ExplainError::MalformedResponse("no candidate content".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        return Err(ExplainError::MalformedResponse("empty response text".to_string()));
    }

    parse_explanation(&text)
}

fn parse_explanation(text: &str) -> Result<Explanation, ExplainError> {
    let json = CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text.trim(), |m| m.as_str());

    let explanation: Explanation = serde_json::from_str(json)?;
    if explanation.step_by_step.is_empty() {
        return Err(ExplainError::MalformedResponse("no steps".to_string()));
    }
    Ok(explanation)
}

fn build_headers(api_key: &str) -> Result<HeaderMap, ExplainError> {
    let key = HeaderValue::from_str(api_key).map_err(|_| ExplainError::InvalidApiKey)?;
    let mut headers = HeaderMap::new();
    headers.insert("x-goog-api-key", key);
    headers.insert("accept", HeaderValue::from_static("application/json"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"stepByStep":["2 + 2 = 4"],"concept":"Addition","realWorldUsage":"Budgeting"}"#;

    fn response_with_text(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": text }]
                }
            }]
        })
    }

    #[test]
    fn build_request_carries_prompt_and_schema() {
        let request = build_request("Explain 1+1");
        assert_eq!(request["contents"][0]["parts"][0]["text"], json!("Explain 1+1"));
        assert_eq!(
            request["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(
            request["generationConfig"]["responseSchema"]["required"],
            json!(["stepByStep", "concept", "realWorldUsage"])
        );
    }

    #[test]
    fn parse_response_extracts_explanation() {
        let explanation = parse_response(&response_with_text(PAYLOAD)).unwrap();
        assert_eq!(explanation.step_by_step, vec!["2 + 2 = 4"]);
        assert_eq!(explanation.concept, "Addition");
        assert_eq!(explanation.real_world_usage, "Budgeting");
    }

    #[test]
    fn parse_response_joins_split_parts() {
        let (head, tail) = PAYLOAD.split_at(20);
        let value = json!({
            "candidates": [{
                "content": { "parts": [{ "text": head }, { "text": tail }] }
            }]
        });
        assert!(parse_response(&value).is_ok());
    }

    #[test]
    fn parse_response_strips_code_fence() {
        let fenced = format!("```json\n{PAYLOAD}\n```");
        assert!(parse_response(&response_with_text(&fenced)).is_ok());
    }

    #[test]
    fn parse_response_rejects_malformed_bodies() {
        assert!(matches!(
            parse_response(&json!({ "candidates": [] })),
            Err(ExplainError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(&response_with_text("   ")),
            Err(ExplainError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(&response_with_text("not json")),
            Err(ExplainError::Payload(_))
        ));
        assert!(matches!(
            parse_response(&response_with_text(r#"{"concept":"x"}"#)),
            Err(ExplainError::Payload(_))
        ));
        assert!(matches!(
            parse_response(&response_with_text(
                r#"{"stepByStep":[],"concept":"x","realWorldUsage":"y"}"#
            )),
            Err(ExplainError::MalformedResponse(_))
        ));
    }

    #[test]
    fn config_api_key_wins_over_env() {
        assert_eq!(
            resolve_api_key(Some("  from-config "), "NOVACALC_TEST_UNSET_KEY"),
            Some("from-config".to_string())
        );
        assert_eq!(resolve_api_key(Some(""), "NOVACALC_TEST_UNSET_KEY"), None);
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert!(matches!(
            client.explain("1+1", "2").await,
            Err(ExplainError::MissingApiKey)
        ));
    }

    #[test]
    fn build_headers_rejects_unprintable_key() {
        assert!(matches!(
            build_headers("abc\ndef"),
            Err(ExplainError::InvalidApiKey)
        ));
        let headers = build_headers("secret").unwrap();
        assert_eq!(headers["x-goog-api-key"], "secret");
    }

    #[tokio::test]
    async fn invalid_api_key_fails_without_network() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: Some("bad\u{7f}key".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert!(matches!(
            client.explain("1+1", "2").await,
            Err(ExplainError::InvalidApiKey)
        ));
    }
}

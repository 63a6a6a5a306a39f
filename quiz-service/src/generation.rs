//! Text generation provider.
//!
//! [`TextGenerator`] is the seam the explanation and feedback components call;
//! [`GeminiClient`] implements it against the Gemini `generateContent` REST API.
use std::future::Future;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::EnvVars;

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("generation provider timed out")]
    Timeout,
    #[error("generation provider unreachable: {0}")]
    Transport(String),
    #[error("generation provider returned status {0}")]
    Status(u16),
    #[error("malformed generation response: {0}")]
    Malformed(String),
    #[error("generation provider returned no text")]
    EmptyResponse,
}

impl ProviderError {
    /// 503 when the provider could not be reached in time, 502 when it answered badly.
    pub fn status(&self) -> StatusCode {
        match self {
            ProviderError::Timeout | ProviderError::Transport(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ProviderError::Status(_)
            | ProviderError::Malformed(_)
            | ProviderError::EmptyResponse => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ProviderError::Timeout
        } else if error.is_decode() {
            ProviderError::Malformed(error.to_string())
        } else if let Some(status) = error.status() {
            ProviderError::Status(status.as_u16())
        } else {
            ProviderError::Transport(error.to_string())
        }
    }
}

pub trait TextGenerator: Send + Sync + 'static {
    /// Sends one prompt and returns the generated text.
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(env_vars: &EnvVars) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(env_vars.provider_timeout)
            .connect_timeout(env_vars.provider_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: env_vars.gemini_base_url.clone(),
            model: env_vars.gemini_model.clone(),
            api_key: env_vars.gemini_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl TextGenerator for GeminiClient {
    #[tracing::instrument(
        skip_all,
        fields(model = %self.model, prompt_len = request.prompt.len()),
        err(Debug)
    )]
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let body = GenerateContentRequest::from(request);

        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body_len = text.len(),
                "generation provider returned an error"
            );
            tracing::debug!(body = %text, "generation provider error body");
            return Err(ProviderError::Status(status.as_u16()));
        }

        let response: GenerateContentResponse = res.json().await?;
        let text = extract_text(response)?;
        tracing::debug!(len = text.len(), "generation succeeded");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

impl From<GenerationRequest> for GenerateContentRequest {
    fn from(request: GenerationRequest) -> Self {
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Joins the text parts of the first candidate, skipping thought summaries.
pub fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!("prompt blocked: {reason}"))
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ProviderError::Malformed(reason));
    };

    let Some(content) = candidate.content else {
        return Err(ProviderError::Malformed("candidate has no content".to_string()));
    };

    let text: String = content
        .parts
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn request_uses_gemini_field_names() {
        let body = GenerateContentRequest::from(GenerationRequest {
            prompt: "hello".to_string(),
            temperature: 0.5,
            max_output_tokens: 42,
        });
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 42);
        assert_eq!(value["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn extracts_and_trims_text() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"  Paris "},{"text":"is the capital.\n"}],"role":"model"}}]}"#,
        );
        assert_eq!(extract_text(response).unwrap(), "Paris is the capital.");
    }

    #[test]
    fn skips_thought_parts() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"thinking...","thought":true},{"text":"answer"}]}}]}"#,
        );
        assert_eq!(extract_text(response).unwrap(), "answer");
    }

    #[test]
    fn missing_candidates_is_malformed() {
        let err = extract_text(parse(r#"{}"#)).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(ref m) if m == "no candidates"));

        let err = extract_text(parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn candidate_without_content_is_malformed() {
        let err = extract_text(parse(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn blank_text_is_empty_response() {
        let err = extract_text(parse(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#))
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[test]
    fn provider_errors_map_to_gateway_statuses() {
        assert_eq!(ProviderError::Timeout.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ProviderError::Transport("refused".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ProviderError::Status(429).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProviderError::EmptyResponse.status(), StatusCode::BAD_GATEWAY);
    }
}

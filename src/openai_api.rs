use crate::config::OpenAiConfig;
use crate::suggest::{CompletionBackend, SuggestError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const SUGGEST_TIMEOUT_SECONDS: u64 = 60;

/// Body of a `/responses` call, as far as text extraction cares.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsesPayload {
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default)]
    pub output: Option<Vec<OutputItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub content: Option<Vec<ContentBlock>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub text: Option<Value>,
}

/// Shape of an error body returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorEnvelope {
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Vision-capable client for the OpenAI Responses API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, api_key: &str) -> Result<Self, SuggestError> {
        Ok(OpenAiClient {
            client: build_client(api_key, SUGGEST_TIMEOUT_SECONDS)?,
            endpoint: format!("{}/responses", config.base_url.trim_end_matches('/')),
        })
    }
}

impl CompletionBackend for OpenAiClient {
    async fn create_response(
        &self,
        model: &str,
        prompt: &str,
        image_data_url: &str,
    ) -> Result<ResponsesPayload, SuggestError> {
        let body = build_request_body(model, prompt, image_data_url);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|error| transport_error(&self.endpoint, &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SuggestError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ResponsesPayload>()
            .await
            .map_err(|error| SuggestError::InvalidResponse(error.to_string()))
    }
}

pub fn build_request_body(model: &str, prompt: &str, image_data_url: &str) -> Value {
    json!({
        "model": model,
        "input": [
            {
                "role": "user",
                "content": [
                    { "type": "input_text", "text": prompt },
                    { "type": "input_image", "image_url": image_data_url }
                ]
            }
        ]
    })
}

fn transport_error(endpoint: &str, error: &reqwest::Error) -> SuggestError {
    if error.is_timeout() {
        return SuggestError::Timeout(format!(
            "OpenAI request timed out at {} after {} seconds",
            endpoint, SUGGEST_TIMEOUT_SECONDS
        ));
    }

    if error.is_connect() {
        return SuggestError::Transport(format!("OpenAI connection failed at {}", endpoint));
    }

    SuggestError::Transport(format!("OpenAI transport error at {}: {}", endpoint, error))
}

fn build_client(api_key: &str, timeout_seconds: u64) -> Result<reqwest::Client, SuggestError> {
    let mut headers = HeaderMap::new();

    let token = api_key.trim();
    if !token.is_empty() {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|error| SuggestError::Transport(format!("Invalid API key: {}", error)))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|error| SuggestError::Transport(error.to_string()))
}

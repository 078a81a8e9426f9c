//! Caption/hashtag suggestions: input validation, prompt construction,
//! primary-to-fallback model retry and labeled-field extraction.

use crate::openai_api::{ApiErrorEnvelope, ResponsesPayload};
use serde::{Deserialize, Serialize};
use std::future::Future;

const MODEL_NOT_FOUND_CODE: &str = "model_not_found";
const IMAGE_DATA_URL_PREFIX: &str = "data:image/";
const PROMPT_PREAMBLE: &str =
    "Analyze the image. Write in a polished Instagram style. Avoid cliches and keep it natural.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestMode {
    Caption,
    Hashtags,
    Both,
}

impl SuggestMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "caption" => Some(Self::Caption),
            "hashtags" => Some(Self::Hashtags),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Caption => "caption",
            Self::Hashtags => "hashtags",
            Self::Both => "both",
        }
    }

    pub fn wants_caption(self) -> bool {
        matches!(self, Self::Caption | Self::Both)
    }

    pub fn wants_hashtags(self) -> bool {
        matches!(self, Self::Hashtags | Self::Both)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResult {
    pub caption: String,
    pub hashtags: String,
    pub raw: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SuggestError {
    #[error("{0}")]
    Validation(String),
    #[error("OpenAI error: {body}")]
    Upstream { status: u16, body: String },
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    Transport(String),
    #[error("OpenAI returned an unreadable response: {0}")]
    InvalidResponse(String),
}

/// Upstream failure classes that matter for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ModelNotFound,
    Other,
}

/// Classifies an upstream error body by its structured `error.code` field.
pub fn classify_failure(body: &str) -> FailureKind {
    let code = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|detail| detail.code);
    match code.as_deref() {
        Some(MODEL_NOT_FOUND_CODE) => FailureKind::ModelNotFound,
        _ => FailureKind::Other,
    }
}

/// A text-completion endpoint that accepts an image input.
pub trait CompletionBackend {
    fn create_response(
        &self,
        model: &str,
        prompt: &str,
        image_data_url: &str,
    ) -> impl Future<Output = Result<ResponsesPayload, SuggestError>> + Send;
}

/// Model output, either flattened by the API or as nested content blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutput {
    Flattened(String),
    Blocks(Vec<String>),
}

impl From<ResponsesPayload> for ModelOutput {
    fn from(payload: ResponsesPayload) -> Self {
        if let Some(text) = payload.output_text.as_deref().map(str::trim) {
            if !text.is_empty() {
                return ModelOutput::Flattened(text.to_string());
            }
        }

        let chunks = payload
            .output
            .unwrap_or_default()
            .into_iter()
            .flat_map(|item| item.content.unwrap_or_default())
            .filter_map(|block| match block.text {
                Some(serde_json::Value::String(text)) => Some(text),
                _ => None,
            })
            .collect();
        ModelOutput::Blocks(chunks)
    }
}

impl ModelOutput {
    pub fn text(&self) -> String {
        match self {
            ModelOutput::Flattened(text) => text.clone(),
            ModelOutput::Blocks(chunks) => chunks.join("\n").trim().to_string(),
        }
    }
}

pub fn build_prompt(mode: SuggestMode) -> String {
    match mode {
        SuggestMode::Caption => {
            format!("{PROMPT_PREAMBLE} Return exactly:\nCAPTION: <one caption only>")
        }
        SuggestMode::Hashtags => format!(
            "{PROMPT_PREAMBLE} Return exactly:\nHASHTAGS: <5-12 relevant hashtags, space-separated, each starts with #>"
        ),
        SuggestMode::Both => format!(
            "{PROMPT_PREAMBLE} Return exactly two lines:\nCAPTION: <one caption>\nHASHTAGS: <5-12 relevant hashtags, space-separated, each starts with #>"
        ),
    }
}

pub fn is_image_data_url(value: &str) -> bool {
    value.starts_with(IMAGE_DATA_URL_PREFIX) && value.contains(',')
}

/// Returns the text after the first `label:` (case-insensitive) up to the end
/// of its line, trimmed, or an empty string. Whitespace after the colon may
/// span line breaks, so a value placed on the following line is still found.
pub fn extract_labeled_field(text: &str, label: &str) -> String {
    let marker = format!("{}:", label.to_ascii_lowercase());
    let lower = text.to_ascii_lowercase();
    let mut from = 0;
    while let Some(found) = lower[from..].find(&marker) {
        let start = from + found + marker.len();
        let rest = text[start..].trim_start();
        let line = rest.split(['\n', '\r']).next().unwrap_or_default().trim();
        if !line.is_empty() {
            return line.to_string();
        }
        from = start;
    }
    String::new()
}

pub fn parse_suggestion(text: String) -> SuggestionResult {
    SuggestionResult {
        caption: extract_labeled_field(&text, "CAPTION"),
        hashtags: extract_labeled_field(&text, "HASHTAGS"),
        raw: text,
    }
}

/// Suggestion service bound to one backend and its model pair.
#[derive(Clone)]
pub struct Suggester<B> {
    backend: B,
    model: String,
    fallback_model: String,
}

impl<B: CompletionBackend> Suggester<B> {
    pub fn new(backend: B, model: &str, fallback_model: &str) -> Self {
        Suggester {
            backend,
            model: model.trim().to_string(),
            fallback_model: fallback_model.trim().to_string(),
        }
    }

    pub async fn suggest(
        &self,
        mode: &str,
        image_data_url: &str,
    ) -> Result<SuggestionResult, SuggestError> {
        let mode = SuggestMode::parse(mode)
            .ok_or_else(|| SuggestError::Validation("Invalid mode".to_string()))?;
        if !is_image_data_url(image_data_url) {
            return Err(SuggestError::Validation(
                "Invalid or missing imageDataUrl".to_string(),
            ));
        }

        let prompt = build_prompt(mode);
        let payload = match self
            .backend
            .create_response(&self.model, &prompt, image_data_url)
            .await
        {
            Ok(payload) => payload,
            Err(SuggestError::Upstream { status, body }) if self.should_fall_back(&body) => {
                log::warn!(
                    "Model {} unavailable ({}), retrying with {}",
                    self.model,
                    status,
                    self.fallback_model
                );
                self.backend
                    .create_response(&self.fallback_model, &prompt, image_data_url)
                    .await?
            }
            Err(error) => return Err(error),
        };

        Ok(parse_suggestion(ModelOutput::from(payload).text()))
    }

    fn should_fall_back(&self, body: &str) -> bool {
        !self.fallback_model.is_empty()
            && self.fallback_model != self.model
            && classify_failure(body) == FailureKind::ModelNotFound
    }
}

//! Generation backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for generation backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for the Gemini `generateContent` API and for
//! `OpenAI`-compatible image and chat APIs. All backends communicate over
//! HTTP via `reqwest`.
//!
//! Backends take fully rendered prompts. Illustrations come back as a data
//! URI (`data:image/png;base64,...`) or a plain URL; messages come back as
//! trimmed text.

use serde_json::Value;
use tracing::debug;

use forest_core::error::GenerationError;

use crate::config::{BackendConfig, BackendType};

// ---------------------------------------------------------------------------
// Unified backend enum (dyn-compatible alternative to async trait)
// ---------------------------------------------------------------------------

/// A generation backend that turns prompts into images and text.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible in Rust.
pub enum GenerationBackend {
    /// Google Gemini `generateContent` API.
    Gemini(GeminiBackend),
    /// `OpenAI`-compatible images and chat completions APIs.
    OpenAi(OpenAiBackend),
    /// No remote service; every call fails with
    /// [`GenerationError::Disabled`].
    Offline,
}

impl GenerationBackend {
    /// Generate an image for `prompt` and return its reference.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Backend`] if the HTTP call fails,
    /// [`GenerationError::EmptyResponse`] if the response holds no image, or
    /// [`GenerationError::Disabled`] for the offline backend.
    pub async fn illustrate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self {
            Self::Gemini(backend) => backend.illustrate(prompt).await,
            Self::OpenAi(backend) => backend.illustrate(prompt).await,
            Self::Offline => Err(GenerationError::Disabled),
        }
    }

    /// Generate text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Backend`] if the HTTP call fails,
    /// [`GenerationError::EmptyResponse`] if the response holds no text, or
    /// [`GenerationError::Disabled`] for the offline backend.
    pub async fn compose(&self, prompt: &str) -> Result<String, GenerationError> {
        match self {
            Self::Gemini(backend) => backend.compose(prompt).await,
            Self::OpenAi(backend) => backend.compose(prompt).await,
            Self::Offline => Err(GenerationError::Disabled),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::OpenAi(_) => "openai-compatible",
            Self::Offline => "offline",
        }
    }
}

/// Send a JSON request and return the parsed JSON response.
async fn send_json(
    request: reqwest::RequestBuilder,
    body: &Value,
    vendor: &str,
) -> Result<Value, GenerationError> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| GenerationError::Backend(format!("{vendor} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(GenerationError::Backend(format!(
            "{vendor} returned {status}: {error_body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| GenerationError::Backend(format!("{vendor} response parse failed: {e}")))
}

// ---------------------------------------------------------------------------
// Gemini backend
// ---------------------------------------------------------------------------

/// Backend for the Gemini `generateContent` API.
///
/// Sends requests to `{api_url}/models/{model}:generateContent` with the key
/// in the `x-goog-api-key` header. Images come back as `inlineData` parts.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    image_model: String,
    text_model: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        }
    }

    async fn generate(&self, model: &str, body: &Value) -> Result<Value, GenerationError> {
        let url = format!("{}/models/{model}:generateContent", self.api_url);
        debug!(model, "gemini generateContent");
        let request = self.client.post(&url).header("x-goog-api-key", &self.api_key);
        send_json(request, body, "Gemini").await
    }

    async fn illustrate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "imageConfig": {"aspectRatio": "1:1"}
            }
        });
        let json = self.generate(&self.image_model, &body).await?;
        extract_gemini_image(&json)
    }

    async fn compose(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });
        let json = self.generate(&self.text_model, &body).await?;
        extract_gemini_text(&json)
    }
}

/// The parts of the first Gemini candidate.
fn gemini_parts(json: &Value) -> Result<&[Value], GenerationError> {
    if let Some(reason) = json
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Err(GenerationError::EmptyResponse(format!(
            "Gemini blocked the prompt: {reason}"
        )));
    }

    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            GenerationError::EmptyResponse(
                "Gemini response missing candidates[0].content.parts".to_owned(),
            )
        })
}

/// Extract the first inline image of a Gemini response as a data URI.
fn extract_gemini_image(json: &Value) -> Result<String, GenerationError> {
    gemini_parts(json)?
        .iter()
        .filter_map(|part| part.get("inlineData").or_else(|| part.get("inline_data")))
        .find_map(|inline| {
            let data = inline.get("data").and_then(Value::as_str)?;
            let mime = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or("image/png");
            (!data.is_empty()).then(|| format!("data:{mime};base64,{data}"))
        })
        .ok_or_else(|| {
            GenerationError::EmptyResponse("Gemini response contained no inline image".to_owned())
        })
}

/// Extract the concatenated text parts of a Gemini response.
fn extract_gemini_text(json: &Value) -> Result<String, GenerationError> {
    let text: String = gemini_parts(json)?
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    non_empty(&text, "Gemini response contained no text")
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for `OpenAI`-compatible APIs.
///
/// Illustrations go to `{api_url}/images/generations` and messages to
/// `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    image_model: String,
    text_model: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, GenerationError> {
        let url = format!("{}/{path}", self.api_url);
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        send_json(request, body, "OpenAI").await
    }

    async fn illustrate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
            "response_format": "b64_json"
        });
        let json = self.post("images/generations", &body).await?;
        extract_openai_image(&json)
    }

    async fn compose(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.text_model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.9,
            "max_tokens": 128
        });
        let json = self.post("chat/completions", &body).await?;
        extract_openai_content(&json)
    }
}

/// Extract the image of an `OpenAI` images response as a data URI or URL.
fn extract_openai_image(json: &Value) -> Result<String, GenerationError> {
    let first = json.get("data").and_then(|d| d.get(0));
    if let Some(b64) = first
        .and_then(|d| d.get("b64_json"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return Ok(format!("data:image/png;base64,{b64}"));
    }
    first
        .and_then(|d| d.get("url"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            GenerationError::EmptyResponse(
                "OpenAI response missing data[0].b64_json and data[0].url".to_owned(),
            )
        })
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &Value) -> Result<String, GenerationError> {
    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            GenerationError::EmptyResponse(
                "OpenAI response missing choices[0].message.content".to_owned(),
            )
        })?;
    non_empty(content, "OpenAI response content was empty")
}

/// Trim `text`, rejecting it if nothing remains.
fn non_empty(text: &str, context: &str) -> Result<String, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(GenerationError::EmptyResponse(context.to_owned()))
    } else {
        Ok(trimmed.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create a generation backend from configuration.
///
/// Dispatches to [`GeminiBackend`], [`OpenAiBackend`], or the offline
/// variant based on the configured [`BackendType`].
pub fn create_backend(config: &BackendConfig) -> GenerationBackend {
    match config.backend_type {
        BackendType::Gemini => GenerationBackend::Gemini(GeminiBackend::new(config)),
        BackendType::OpenAi => GenerationBackend::OpenAi(OpenAiBackend::new(config)),
        BackendType::Offline => GenerationBackend::Offline,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn config(backend_type: BackendType) -> BackendConfig {
        BackendConfig {
            backend_type,
            api_url: "https://example.invalid/v1".to_owned(),
            api_key: "test".to_owned(),
            image_model: "image-model".to_owned(),
            text_model: "text-model".to_owned(),
            templates_dir: PathBuf::from("templates"),
        }
    }

    #[test]
    fn extract_gemini_image_builds_data_uri() {
        let json = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your tree."},
                        {"inlineData": {"mimeType": "image/webp", "data": "UklGRg=="}}
                    ]
                }
            }]
        });
        assert_eq!(
            extract_gemini_image(&json),
            Ok("data:image/webp;base64,UklGRg==".to_owned())
        );
    }

    #[test]
    fn extract_gemini_image_defaults_to_png() {
        let json = serde_json::json!({
            "candidates": [{"content": {"parts": [{"inline_data": {"data": "iVBOR"}}]}}]
        });
        assert_eq!(
            extract_gemini_image(&json),
            Ok("data:image/png;base64,iVBOR".to_owned())
        );
    }

    #[test]
    fn extract_gemini_image_without_inline_data_is_empty() {
        let json = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot draw that."}]}}]
        });
        assert!(matches!(
            extract_gemini_image(&json),
            Err(GenerationError::EmptyResponse(_))
        ));
    }

    #[test]
    fn extract_gemini_blocked_prompt() {
        let json = serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let result = extract_gemini_text(&json);
        assert!(
            matches!(&result, Err(GenerationError::EmptyResponse(m)) if m.contains("SAFETY")),
            "got {result:?}"
        );
    }

    #[test]
    fn extract_gemini_text_joins_and_trims_parts() {
        let json = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "  나무가 "}, {"text": "자라요! 🌳\n"}]}
            }]
        });
        assert_eq!(extract_gemini_text(&json), Ok("나무가 자라요! 🌳".to_owned()));
    }

    #[test]
    fn extract_gemini_text_whitespace_only_is_empty() {
        let json = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "  \n"}]}}]
        });
        assert!(matches!(
            extract_gemini_text(&json),
            Err(GenerationError::EmptyResponse(_))
        ));
    }

    #[test]
    fn extract_openai_image_prefers_b64() {
        let json = serde_json::json!({
            "data": [{"b64_json": "AAAA", "url": "https://cdn.example/tree.png"}]
        });
        assert_eq!(
            extract_openai_image(&json),
            Ok("data:image/png;base64,AAAA".to_owned())
        );

        let url_only = serde_json::json!({"data": [{"url": "https://cdn.example/tree.png"}]});
        assert_eq!(
            extract_openai_image(&url_only),
            Ok("https://cdn.example/tree.png".to_owned())
        );
    }

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{"message": {"content": "오늘도 한 걸음! 🌱"}}]
        });
        assert_eq!(
            extract_openai_content(&json),
            Ok("오늘도 한 걸음! 🌱".to_owned())
        );
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        assert!(extract_openai_content(&json).is_err());
    }

    #[test]
    fn create_backend_dispatches_correctly() {
        assert_eq!(create_backend(&config(BackendType::Gemini)).name(), "gemini");
        assert_eq!(
            create_backend(&config(BackendType::OpenAi)).name(),
            "openai-compatible"
        );
        assert_eq!(create_backend(&config(BackendType::Offline)).name(), "offline");
    }

    #[tokio::test]
    async fn offline_backend_is_disabled() {
        let backend = create_backend(&config(BackendType::Offline));
        assert_eq!(backend.illustrate("tree").await, Err(GenerationError::Disabled));
        assert_eq!(backend.compose("hi").await, Err(GenerationError::Disabled));
    }
}

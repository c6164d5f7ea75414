//! Anthropic Messages API call with the screenshot attached as an image
//! block. One request, no retry.

use super::prompts::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DESCRIBE_PROMPT, MAX_TOKENS};
use super::AnalysisError;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct VisionAnalyzer {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl VisionAnalyzer {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends the PNG at `path` and returns the model's description.
    pub async fn analyze(&self, path: &Path) -> Result<String, AnalysisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AnalysisError::MissingCredential)?;

        let png_bytes = tokio::fs::read(path).await?;
        let body = build_request_body(&self.model, &STANDARD.encode(&png_bytes));

        log::info!(
            "[ANALYSIS] Sending {} ({} bytes) to {}",
            path.display(),
            png_bytes.len(),
            self.model
        );
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(self.endpoint.as_str())
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response.json().await?;
        log::info!("[ANALYSIS] API latency: {}ms", start.elapsed().as_millis());

        extract_description(&json)
    }
}

/// Messages API body: one user turn with the image then the instruction.
pub fn build_request_body(model: &str, png_base64: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "messages": [{
            "role": "user",
            "content": [
                {
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": "image/png",
                        "data": png_base64,
                    }
                },
                { "type": "text", "text": DESCRIBE_PROMPT }
            ]
        }]
    })
}

/// Joins the text blocks of a Messages API response.
pub fn extract_description(response: &serde_json::Value) -> Result<String, AnalysisError> {
    let text: Vec<&str> = response["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"] == "text")
                .filter_map(|b| b["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    let joined = text.join("\n").trim().to_string();
    if joined.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(joined)
}

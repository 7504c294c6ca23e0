//! Vision Step: raw image bytes -> one line of dish description via Gemini.
//!
//! The output is advisory only; the user verifies or edits it before it
//! re-enters the pipeline as `verified_text`.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::CouncilError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const SYSTEM_INSTRUCTION: &str = "You are a food recognition expert specializing in Tunisian cuisine. \
     Identify the dish, visible ingredients, and estimate portion sizes. \
     Output ONLY a concise text description (e.g., 'Bowl of Lablabi with tuna and egg, approx 400g'). \
     Do not include explanations or additional commentary.";

const USER_PROMPT: &str = "Identify this Tunisian dish and estimate the portion size. \
     Provide a concise description only.";

#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze_image(&self, image_bytes: &[u8]) -> Result<String, CouncilError>;
}

pub struct GeminiVision {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiVision {
    pub fn new(api_key: String, model: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ImageAnalyzer for GeminiVision {
    async fn analyze_image(&self, image_bytes: &[u8]) -> Result<String, CouncilError> {
        let encoded = BASE64.encode(image_bytes);
        let payload = json!({
            "system_instruction": { "parts": [ { "text": SYSTEM_INSTRUCTION } ] },
            "contents": [ {
                "parts": [
                    { "text": USER_PROMPT },
                    { "inline_data": { "mime_type": "image/jpeg", "data": encoded } }
                ]
            } ]
        });

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CouncilError::Vision(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CouncilError::Vision(format!("{status}: {body}")));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CouncilError::Vision(format!("malformed response: {e}")))?;

        let detected_text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_default();

        if detected_text.is_empty() {
            return Err(CouncilError::Vision("model returned no description".into()));
        }

        debug!(chars = detected_text.len(), "vision description extracted");
        Ok(detected_text)
    }
}

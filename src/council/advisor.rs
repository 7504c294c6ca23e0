//! Advisor Step: meal context -> one sentence of dietary advice from a
//! configurable chat-completion provider (Groq by default, OpenRouter as the
//! alternative). New providers only need another `AdviceProvider` impl; the
//! orchestrator never branches on which one is active.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CouncilError, HealthGoal};

/// Advice generation tolerates a slower model than the nutrition lookup.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a nutritionist specializing in Tunisian cuisine.";

/// Everything the advisor needs about the meal that was just logged.
/// `remaining_calories` may be negative when the daily goal is exceeded;
/// that is meaningful input, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct AdviceRequest {
    pub health_goal: HealthGoal,
    pub dish_name: String,
    pub total_calories: f64,
    pub remaining_calories: f64,
}

pub fn build_prompt(request: &AdviceRequest) -> String {
    format!(
        "You are a nutritionist specializing in Tunisian cuisine. \
         Provide ONE concise sentence of specific dietary advice for the rest of the day. \
         Be encouraging and practical.\n\n\
         User Goal: {}\n\
         Just ate: {} ({} calories)\n\
         Remaining calories for today: {}\n\
         Give specific advice for the rest of the day.",
        request.health_goal,
        request.dish_name,
        request.total_calories,
        request.remaining_calories
    )
}

#[async_trait]
pub trait AdviceProvider: Send + Sync {
    async fn generate_advice(&self, request: &AdviceRequest) -> Result<String, CouncilError>;
}

// Both providers speak the OpenAI chat-completions dialect.

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

async fn chat_completion(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    model: &str,
    messages: Vec<ChatMessage<'_>>,
) -> Result<String, CouncilError> {
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(&ChatRequest { model, messages })
        .send()
        .await
        .map_err(|e| CouncilError::Advice(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CouncilError::Advice(format!("{status}: {body}")));
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| CouncilError::Advice(format!("malformed response: {e}")))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| CouncilError::Advice("response contained no choices".into()))?;

    Ok(content.trim().to_string())
}

pub struct GroqAdvisor {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GroqAdvisor {
    pub fn new(api_key: String, model: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl AdviceProvider for GroqAdvisor {
    async fn generate_advice(&self, request: &AdviceRequest) -> Result<String, CouncilError> {
        let prompt = build_prompt(request);
        let advice = chat_completion(
            &self.client,
            GROQ_URL,
            &self.api_key,
            &self.model,
            vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        )
        .await?;
        debug!(provider = "groq", chars = advice.len(), "advice generated");
        Ok(advice)
    }
}

pub struct OpenRouterAdvisor {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterAdvisor {
    pub fn new(api_key: String, model: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl AdviceProvider for OpenRouterAdvisor {
    async fn generate_advice(&self, request: &AdviceRequest) -> Result<String, CouncilError> {
        let prompt = build_prompt(request);
        let advice = chat_completion(
            &self.client,
            OPENROUTER_URL,
            &self.api_key,
            &self.model,
            vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        )
        .await?;
        debug!(
            provider = "openrouter",
            chars = advice.len(),
            "advice generated"
        );
        Ok(advice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_all_four_values() {
        let prompt = build_prompt(&AdviceRequest {
            health_goal: HealthGoal::GainMuscle,
            dish_name: "Couscous with vegetables, 350g".into(),
            total_calories: 450.0,
            remaining_calories: 1050.0,
        });

        assert!(prompt.contains("gain_muscle"));
        assert!(prompt.contains("Couscous with vegetables, 350g"));
        assert!(prompt.contains("(450 calories)"));
        assert!(prompt.contains("Remaining calories for today: 1050"));
    }

    #[test]
    fn prompt_carries_negative_remaining_budget() {
        let prompt = build_prompt(&AdviceRequest {
            health_goal: HealthGoal::LoseWeight,
            dish_name: "Brik with egg".into(),
            total_calories: 300.0,
            remaining_calories: -250.0,
        });

        assert!(prompt.contains("Remaining calories for today: -250"));
    }
}

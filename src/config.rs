use std::str::FromStr;

use anyhow::Context;

/// Which text-generation provider backs the Advisor Step. Chosen once at
/// startup; exactly one is active per process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorProvider {
    Groq,
    OpenRouter,
}

impl FromStr for AdvisorProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openrouter" => Ok(Self::OpenRouter),
            other => anyhow::bail!(
                "unknown ADVISOR_PROVIDER '{other}' (expected 'groq' or 'openrouter')"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct NutritionConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub provider: AdvisorProvider,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub vision: VisionConfig,
    pub nutrition: NutritionConfig,
    pub advisor: AdvisorConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;

        let vision = VisionConfig {
            api_key: std::env::var("GOOGLE_API_KEY").context("GOOGLE_API_KEY is required")?,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into()),
        };

        let nutrition = NutritionConfig {
            api_key: std::env::var("CALORIENINJAS_API_KEY")
                .context("CALORIENINJAS_API_KEY is required")?,
            base_url: std::env::var("CALORIENINJAS_URL")
                .unwrap_or_else(|_| "https://api.calorieninjas.com/v1/nutrition".into()),
        };

        // Only the provider name has a default; model and credential must be
        // supplied for whichever provider is selected.
        let provider: AdvisorProvider = std::env::var("ADVISOR_PROVIDER")
            .unwrap_or_else(|_| "groq".into())
            .parse()?;
        let advisor = match provider {
            AdvisorProvider::Groq => AdvisorConfig {
                provider,
                api_key: std::env::var("GROQ_API_KEY").context("GROQ_API_KEY is required")?,
                model: std::env::var("GROQ_MODEL").context("GROQ_MODEL is required")?,
            },
            AdvisorProvider::OpenRouter => AdvisorConfig {
                provider,
                api_key: std::env::var("OPENROUTER_API_KEY")
                    .context("OPENROUTER_API_KEY is required")?,
                model: std::env::var("OPENROUTER_MODEL").context("OPENROUTER_MODEL is required")?,
            },
        };

        Ok(Self {
            database_url,
            vision,
            nutrition,
            advisor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisor_provider_parses_case_insensitively() {
        assert_eq!(
            "groq".parse::<AdvisorProvider>().unwrap(),
            AdvisorProvider::Groq
        );
        assert_eq!(
            "OpenRouter".parse::<AdvisorProvider>().unwrap(),
            AdvisorProvider::OpenRouter
        );
    }

    #[test]
    fn unknown_advisor_provider_is_rejected() {
        assert!("ollama".parse::<AdvisorProvider>().is_err());
    }
}

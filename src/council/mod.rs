//! The AI Council: orchestration of the three provider-backed steps behind
//! the meal-logging workflow (vision -> verified text -> nutrition -> advice).
//!
//! Each step sits behind a trait so the orchestrator never knows which vendor
//! is on the other side; the concrete providers are chosen once at startup
//! from [`AppConfig`] and injected here.

mod advisor;
mod nutrition;
mod vision;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{AdvisorProvider, AppConfig};

pub use advisor::{AdviceProvider, AdviceRequest, GroqAdvisor, OpenRouterAdvisor};
pub use nutrition::{CalorieNinjas, FoodItem, NutritionProvider, NutritionSummary};
pub use vision::{GeminiVision, ImageAnalyzer};

pub(crate) use nutrition::round1;

/// Closed set of failure kinds the pipeline can produce. Callers match on the
/// variant instead of parsing messages; the no-items case in particular must
/// stay distinguishable from transport failures all the way to the boundary.
#[derive(Debug, Error)]
pub enum CouncilError {
    #[error("vision analysis failed: {0}")]
    Vision(String),
    #[error("no food items recognized; try simplifying the description (e.g. 'chickpea soup 300ml' instead of 'Hlalem')")]
    NoItemsRecognized,
    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
    #[error("advice generation failed: {0}")]
    Advice(String),
}

impl CouncilError {
    /// Split a reqwest failure into the timeout / transport kinds so a caller
    /// can decide for itself whether a retry makes sense.
    pub(crate) fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { provider }
        } else {
            Self::Transport {
                provider,
                message: err.to_string(),
            }
        }
    }
}

/// User health objective, stored as a Postgres enum on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "health_goal", rename_all = "snake_case")]
pub enum HealthGoal {
    GainMuscle,
    LoseWeight,
    Maintain,
    Bulk,
    Cut,
}

impl HealthGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthGoal::GainMuscle => "gain_muscle",
            HealthGoal::LoseWeight => "lose_weight",
            HealthGoal::Maintain => "maintain",
            HealthGoal::Bulk => "bulk",
            HealthGoal::Cut => "cut",
        }
    }
}

impl fmt::Display for HealthGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of the user profile the pipeline actually needs.
#[derive(Debug, Clone, Copy)]
pub struct GoalContext {
    pub health_goal: HealthGoal,
    pub daily_calorie_goal: i32,
}

/// Result of one `process_meal` run. Persistence happens afterwards, in the
/// handler, so a failed pipeline never leaves a partial record behind.
#[derive(Debug, Clone)]
pub struct MealAnalysis {
    pub nutrition: NutritionSummary,
    pub ai_advice: String,
}

/// Orchestrator for the three steps. Stateless per invocation and holds no
/// store handle at all; concurrent invocations share nothing mutable.
pub struct Council {
    vision: Arc<dyn ImageAnalyzer>,
    nutrition: Arc<dyn NutritionProvider>,
    advisor: Arc<dyn AdviceProvider>,
}

impl Council {
    pub fn new(
        vision: Arc<dyn ImageAnalyzer>,
        nutrition: Arc<dyn NutritionProvider>,
        advisor: Arc<dyn AdviceProvider>,
    ) -> Self {
        Self {
            vision,
            nutrition,
            advisor,
        }
    }

    /// Build the production council from configuration. The advisor provider
    /// is picked here, once; nothing downstream branches on it again.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let vision = Arc::new(GeminiVision::new(
            config.vision.api_key.clone(),
            config.vision.model.clone(),
        )?);
        let nutrition = Arc::new(CalorieNinjas::new(
            config.nutrition.api_key.clone(),
            config.nutrition.base_url.clone(),
        )?);
        let advisor: Arc<dyn AdviceProvider> = match config.advisor.provider {
            AdvisorProvider::Groq => Arc::new(GroqAdvisor::new(
                config.advisor.api_key.clone(),
                config.advisor.model.clone(),
            )?),
            AdvisorProvider::OpenRouter => Arc::new(OpenRouterAdvisor::new(
                config.advisor.api_key.clone(),
                config.advisor.model.clone(),
            )?),
        };
        Ok(Self::new(vision, nutrition, advisor))
    }

    /// Vision extraction only. No persistence side effect; the caller shows
    /// the text to the user for verification before anything else happens.
    pub async fn analyze(&self, image_bytes: &[u8]) -> Result<String, CouncilError> {
        self.vision.analyze_image(image_bytes).await
    }

    /// Strict two-stage pipeline: nutrition lookup, then advice generation.
    /// The advisor needs the nutrition output, so the stages are sequential by
    /// data dependency; the first failure aborts the rest.
    pub async fn process_meal(
        &self,
        verified_text: &str,
        goals: &GoalContext,
        current_daily_total: f64,
    ) -> Result<MealAnalysis, CouncilError> {
        let nutrition = self.nutrition.lookup(verified_text).await?;

        let new_total = current_daily_total + nutrition.calories;
        let remaining = f64::from(goals.daily_calorie_goal) - new_total;
        debug!(
            calories = nutrition.calories,
            remaining, "nutrition step complete"
        );

        let advice = self
            .advisor
            .generate_advice(&AdviceRequest {
                health_goal: goals.health_goal,
                dish_name: verified_text.to_string(),
                total_calories: nutrition.calories,
                remaining_calories: remaining,
            })
            .await?;

        Ok(MealAnalysis {
            nutrition,
            ai_advice: advice,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct FixedVision(&'static str);

    #[async_trait]
    impl ImageAnalyzer for FixedVision {
        async fn analyze_image(&self, _image_bytes: &[u8]) -> Result<String, CouncilError> {
            Ok(self.0.to_string())
        }
    }

    struct FixedNutrition(NutritionSummary);

    #[async_trait]
    impl NutritionProvider for FixedNutrition {
        async fn lookup(&self, _food_description: &str) -> Result<NutritionSummary, CouncilError> {
            Ok(self.0.clone())
        }
    }

    struct EmptyNutrition;

    #[async_trait]
    impl NutritionProvider for EmptyNutrition {
        async fn lookup(&self, _food_description: &str) -> Result<NutritionSummary, CouncilError> {
            Err(CouncilError::NoItemsRecognized)
        }
    }

    #[derive(Default)]
    struct RecordingAdvisor {
        calls: AtomicUsize,
        last_request: Mutex<Option<AdviceRequest>>,
    }

    #[async_trait]
    impl AdviceProvider for RecordingAdvisor {
        async fn generate_advice(&self, request: &AdviceRequest) -> Result<String, CouncilError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok("Keep dinner light and protein-heavy.".to_string())
        }
    }

    struct FailingAdvisor;

    #[async_trait]
    impl AdviceProvider for FailingAdvisor {
        async fn generate_advice(&self, _request: &AdviceRequest) -> Result<String, CouncilError> {
            Err(CouncilError::Advice("provider unavailable".into()))
        }
    }

    fn fish_summary() -> NutritionSummary {
        NutritionSummary {
            calories: 350.0,
            protein: 40.0,
            carbs: 10.0,
            fats: 12.0,
        }
    }

    #[tokio::test]
    async fn analyze_is_deterministic_and_side_effect_free() {
        let council = Council::new(
            Arc::new(FixedVision("Bowl of Lablabi with tuna and egg, approx 400g")),
            Arc::new(EmptyNutrition),
            Arc::new(RecordingAdvisor::default()),
        );

        let first = council.analyze(b"jpeg bytes").await.unwrap();
        let second = council.analyze(b"jpeg bytes").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "Bowl of Lablabi with tuna and egg, approx 400g");
    }

    #[tokio::test]
    async fn process_meal_passes_exact_remaining_budget_to_advisor() {
        let advisor = Arc::new(RecordingAdvisor::default());
        let council = Council::new(
            Arc::new(FixedVision("")),
            Arc::new(FixedNutrition(fish_summary())),
            advisor.clone(),
        );

        let goals = GoalContext {
            health_goal: HealthGoal::LoseWeight,
            daily_calorie_goal: 2000,
        };
        let result = council
            .process_meal("grilled fish with salad, 300g", &goals, 800.0)
            .await
            .unwrap();

        assert_eq!(result.nutrition, fish_summary());
        assert_eq!(result.ai_advice, "Keep dinner light and protein-heavy.");

        let request = advisor.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.health_goal, HealthGoal::LoseWeight);
        assert_eq!(request.dish_name, "grilled fish with salad, 300g");
        assert_eq!(request.total_calories, 350.0);
        // 2000 - 800 - 350
        assert_eq!(request.remaining_calories, 850.0);
    }

    #[tokio::test]
    async fn remaining_budget_goes_negative_when_goal_exceeded() {
        let advisor = Arc::new(RecordingAdvisor::default());
        let council = Council::new(
            Arc::new(FixedVision("")),
            Arc::new(FixedNutrition(fish_summary())),
            advisor.clone(),
        );

        let goals = GoalContext {
            health_goal: HealthGoal::Cut,
            daily_calorie_goal: 1800,
        };
        council
            .process_meal("couscous with vegetables 350g", &goals, 1700.0)
            .await
            .unwrap();

        let request = advisor.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.remaining_calories, -250.0);
    }

    #[tokio::test]
    async fn nutrition_failure_short_circuits_the_advisor() {
        let advisor = Arc::new(RecordingAdvisor::default());
        let council = Council::new(
            Arc::new(FixedVision("")),
            Arc::new(EmptyNutrition),
            advisor.clone(),
        );

        let goals = GoalContext {
            health_goal: HealthGoal::Maintain,
            daily_calorie_goal: 2500,
        };
        let err = council
            .process_meal("Hlalem", &goals, 0.0)
            .await
            .unwrap_err();

        assert!(matches!(err, CouncilError::NoItemsRecognized));
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn advisor_failure_aborts_the_whole_pipeline() {
        let council = Council::new(
            Arc::new(FixedVision("")),
            Arc::new(FixedNutrition(fish_summary())),
            Arc::new(FailingAdvisor),
        );

        let goals = GoalContext {
            health_goal: HealthGoal::Bulk,
            daily_calorie_goal: 3000,
        };
        let err = council
            .process_meal("grilled chicken breast 200g", &goals, 500.0)
            .await
            .unwrap_err();

        assert!(matches!(err, CouncilError::Advice(_)));
    }
}

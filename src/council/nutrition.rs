//! Nutrition Step: free-text dish description -> summed macro-nutrients via
//! the CalorieNinjas lookup API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CouncilError;

const PROVIDER: &str = "nutrition lookup";

/// Short timeout: the lookup is a simple keyed GET and a caller may want to
/// retry on its own, so fail fast instead of hanging.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Summed macro-nutrients for one dish description. Fields are non-negative
/// and rounded to one decimal; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionSummary {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// One recognized food item as returned by the provider. A single query may
/// decompose into several of these.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodItem {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbohydrates_total_g: f64,
    #[serde(default)]
    pub fat_total_g: f64,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    items: Vec<FoodItem>,
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Collapse the provider's item list into one summary. Every field is summed
/// across ALL items (never a single item, never an average), then rounded.
/// Zero items is a semantic failure, not a zero-valued summary.
fn summarize(items: &[FoodItem]) -> Result<NutritionSummary, CouncilError> {
    if items.is_empty() {
        return Err(CouncilError::NoItemsRecognized);
    }
    Ok(NutritionSummary {
        calories: round1(items.iter().map(|i| i.calories).sum()),
        protein: round1(items.iter().map(|i| i.protein_g).sum()),
        carbs: round1(items.iter().map(|i| i.carbohydrates_total_g).sum()),
        fats: round1(items.iter().map(|i| i.fat_total_g).sum()),
    })
}

#[async_trait]
pub trait NutritionProvider: Send + Sync {
    async fn lookup(&self, food_description: &str) -> Result<NutritionSummary, CouncilError>;
}

pub struct CalorieNinjas {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CalorieNinjas {
    pub fn new(api_key: String, base_url: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(LOOKUP_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl NutritionProvider for CalorieNinjas {
    async fn lookup(&self, food_description: &str) -> Result<NutritionSummary, CouncilError> {
        let response = self
            .client
            .get(&self.base_url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("query", food_description)])
            .send()
            .await
            .map_err(|e| CouncilError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CouncilError::Transport {
                provider: PROVIDER,
                message: format!("{status}: {body}"),
            });
        }

        let parsed: LookupResponse = response.json().await.map_err(|e| CouncilError::Transport {
            provider: PROVIDER,
            message: format!("malformed response: {e}"),
        })?;

        debug!(items = parsed.items.len(), "nutrition lookup returned");
        summarize(&parsed.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(calories: f64, protein: f64, carbs: f64, fats: f64) -> FoodItem {
        FoodItem {
            calories,
            protein_g: protein,
            carbohydrates_total_g: carbs,
            fat_total_g: fats,
        }
    }

    #[test]
    fn sums_every_field_across_all_items() {
        let items = vec![
            item(250.4, 30.1, 2.0, 8.5),
            item(80.2, 9.9, 6.0, 3.0),
            item(19.4, 0.0, 2.0, 0.5),
        ];
        let summary = summarize(&items).unwrap();
        assert_eq!(summary.calories, 350.0);
        assert_eq!(summary.protein, 40.0);
        assert_eq!(summary.carbs, 10.0);
        assert_eq!(summary.fats, 12.0);
    }

    #[test]
    fn sum_is_independent_of_item_order() {
        let mut items = vec![
            item(33.33, 1.11, 2.22, 0.55),
            item(66.67, 2.22, 4.44, 1.11),
            item(100.01, 3.33, 6.66, 1.66),
        ];
        let forward = summarize(&items).unwrap();
        items.reverse();
        let backward = summarize(&items).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn each_summed_field_is_rounded_to_one_decimal() {
        let items = vec![item(33.33, 0.04, 0.0, 0.06), item(33.33, 0.04, 0.0, 0.06)];
        let summary = summarize(&items).unwrap();
        assert_eq!(summary.calories, 66.7);
        assert_eq!(summary.protein, 0.1);
        assert_eq!(summary.carbs, 0.0);
        assert_eq!(summary.fats, 0.1);
    }

    #[test]
    fn zero_items_is_a_semantic_failure_not_a_zero_summary() {
        let err = summarize(&[]).unwrap_err();
        assert!(matches!(err, CouncilError::NoItemsRecognized));
        // the user-facing hint travels with the error
        assert!(err.to_string().contains("simplifying the description"));
    }

    #[test]
    fn single_item_passes_through_rounded() {
        let summary = summarize(&[item(123.456, 7.89, 0.0, 1.0)]).unwrap();
        assert_eq!(summary.calories, 123.5);
        assert_eq!(summary.protein, 7.9);
    }
}

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::tools::{COMPUTE_SCORE_TOOL_NAME, Tool, ToolSchema};

/// Overall score for one restaurant, rounded to exactly 3 decimal places.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub restaurant_name: String,
    pub value: f64,
}

/// Rounds half up at the third decimal place. `f64::round` is
/// half-away-from-zero, which is half-up on this non-negative domain.
pub fn round_to_3_places(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Combines paired food and customer-service ratings into one 0–10 score:
/// `sum_i(sqrt(food[i]^2 * service[i])) * (1 / (N * sqrt(125))) * 10`.
///
/// Total on every input. Empty lists, mismatched lengths, and negative
/// service values (which would take the square root of a negative product)
/// are malformed input and yield 0.000 rather than an error. Values are
/// 1–5 by convention; this is not enforced.
pub fn compute(restaurant_name: &str, food_scores: &[i64], service_scores: &[i64]) -> ScoreResult {
    let malformed = food_scores.is_empty()
        || service_scores.is_empty()
        || food_scores.len() != service_scores.len()
        || service_scores.iter().any(|score| *score < 0);

    if malformed {
        return ScoreResult {
            restaurant_name: restaurant_name.to_string(),
            value: 0.0,
        };
    }

    let n = food_scores.len() as f64;
    let total: f64 = food_scores
        .iter()
        .zip(service_scores)
        .map(|(food, service)| ((food * food * service) as f64).sqrt())
        .sum();

    let value = total * (1.0 / (n * 125.0_f64.sqrt())) * 10.0;

    ScoreResult {
        restaurant_name: restaurant_name.to_string(),
        value: round_to_3_places(value),
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ComputeScoreArgs {
    /// Restaurant the scores belong to.
    pub restaurant_name: String,
    /// Food ratings, one integer 1-5 per review.
    pub food_scores: Vec<i64>,
    /// Customer service ratings, one integer 1-5 per review, same length.
    pub customer_service_scores: Vec<i64>,
}

/// Tool binding over [`compute`].
pub struct ComputeScoreTool;

#[async_trait]
impl Tool for ComputeScoreTool {
    fn name(&self) -> &str {
        COMPUTE_SCORE_TOOL_NAME
    }

    fn describe(&self) -> ToolSchema {
        ToolSchema {
            name: COMPUTE_SCORE_TOOL_NAME.to_string(),
            description: "Calculates the restaurant's final 0-10 score from paired food and \
                          customer service ratings. Args: restaurant_name, food_scores, \
                          customer_service_scores (equal-length integer lists)."
                .to_string(),
            parameters: serde_json::to_value(schemars::schema_for!(ComputeScoreArgs))
                .unwrap_or_else(|_| json!({"type": "object"})),
        }
    }

    async fn invoke(&self, args: Value) -> Result<Value> {
        let args: ComputeScoreArgs = serde_json::from_value(args)
            .map_err(|err| anyhow::anyhow!("invalid calculate_overall_score args: {err}"))?;

        let result = compute(
            &args.restaurant_name,
            &args.food_scores,
            &args.customer_service_scores,
        );
        tracing::info!(
            restaurant = %result.restaurant_name,
            score = result.value,
            pairs = args.food_scores.len(),
            "computed overall score"
        );

        let mut payload = serde_json::Map::new();
        payload.insert(result.restaurant_name, json!(result.value));
        Ok(Value::Object(payload))
    }
}

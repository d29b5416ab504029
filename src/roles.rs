use std::collections::HashMap;
use std::sync::Arc;

use crate::pipeline::{PipelineStage, ReviewPipeline, StageAgent, StageRole};
use crate::tools::review_store::{FetchReviewsTool, ReviewStore};
use crate::tools::score_kernel::ComputeScoreTool;
use crate::tools::{Tool, ToolBindings};

pub fn entrypoint_instruction() -> String {
    "You are the supervising agent for a restaurant analysis process. \
     Coordinate the sequential execution of the other agents and format the \
     final answer for the user."
        .to_string()
}

pub fn fetcher_instruction(restaurant_query: &str) -> String {
    format!(
        "You are an agent specialized in retrieving restaurant data. \
         Your only task is to identify the restaurant name in the query and \
         use the fetch_restaurant_reviews function.\n\
         \n\
         Query: \"{restaurant_query}\"\n\
         \n\
         INSTRUCTIONS:\n\
         1. Identify the exact restaurant name (for example \"Bob's\", \"Paris 6\", \"KFC\")\n\
         2. You MUST call the fetch_restaurant_reviews function with that name\n\
         3. Return the retrieved reviews for the next agent\n\
         \n\
         ALWAYS use the fetch_restaurant_reviews function. Never answer from \
         memory and never fabricate reviews."
    )
}

pub fn analyzer_instruction() -> String {
    "You are an agent specialized in sentiment analysis of restaurant reviews. \
     Analyze the reviews you receive and extract numeric scores for food and \
     customer service.\n\
     \n\
     MANDATORY SCALE (DO NOT MODIFY):\n\
     - 1/5: horrible, disgusting, awful\n\
     - 2/5: bad, unpleasant, offensive\n\
     - 3/5: average, uninspiring, forgettable\n\
     - 4/5: good, enjoyable, satisfying\n\
     - 5/5: awesome, incredible, amazing\n\
     \n\
     PROCESS:\n\
     1. For each review, identify the FOOD and CUSTOMER SERVICE aspects\n\
     2. Convert adjectives using EXACTLY the scale above\n\
     3. Reply in the format: \"food_scores: [X,Y,Z] customer_service_scores: [A,B,C]\"\n\
     \n\
     CONTEXT MAPPING:\n\
     - FOOD: food, taste, ingredients, dishes, quality, flavor, cooked, sandwiches, burgers\n\
     - CUSTOMER SERVICE: service, staff, waiters, baristas, efficient, friendly\n\
     \n\
     If a review does not mention an aspect, use score 3 (average). The two \
     lists must have the same length, one entry per review."
        .to_string()
}

pub fn scorer_instruction() -> String {
    "You are responsible for calculating the restaurant's final score. \
     Take the scores from the previous agent and use the \
     calculate_overall_score function.\n\
     \n\
     INSTRUCTIONS:\n\
     1. Extract food_scores and customer_service_scores from the previous message\n\
     2. ALWAYS call the calculate_overall_score function with:\n\
        - restaurant_name: the restaurant's name\n\
        - food_scores: a list of integers [1,2,3,...]\n\
        - customer_service_scores: a list of integers [1,2,3,...]\n\
     3. Report the score with exactly 3 decimal places\n\
     \n\
     EXPECTED FORMAT:\n\
     \"The average rating of [RESTAURANT] is [X.XXX].\"\n\
     \n\
     ALWAYS use the function. Never compute the formula yourself."
        .to_string()
}

/// Wires the fixed three-stage pipeline for one query. The fetch tool is
/// fully registered on the entrypoint and the fetcher, the score tool on the
/// entrypoint and the scorer; the analyzer works from inference alone. Each
/// agent holds its own independent bindings.
pub fn build_review_pipeline(
    restaurant_query: &str,
    store: ReviewStore,
    max_turns: u32,
) -> ReviewPipeline {
    let fetch_tool: Arc<dyn Tool> = Arc::new(FetchReviewsTool::new(store));
    let score_tool: Arc<dyn Tool> = Arc::new(ComputeScoreTool);

    let mut entrypoint_bindings = ToolBindings::new();
    entrypoint_bindings.register(fetch_tool.clone());
    entrypoint_bindings.register(score_tool.clone());

    let mut fetcher_bindings = ToolBindings::new();
    fetcher_bindings.register(fetch_tool);

    let mut scorer_bindings = ToolBindings::new();
    scorer_bindings.register(score_tool);

    let mut agents = HashMap::new();
    agents.insert(
        StageRole::Entrypoint,
        StageAgent::new(
            StageRole::Entrypoint,
            entrypoint_instruction(),
            entrypoint_bindings,
        ),
    );
    agents.insert(
        StageRole::Fetcher,
        StageAgent::new(
            StageRole::Fetcher,
            fetcher_instruction(restaurant_query),
            fetcher_bindings,
        ),
    );
    agents.insert(
        StageRole::Analyzer,
        StageAgent::new(StageRole::Analyzer, analyzer_instruction(), ToolBindings::new()),
    );
    agents.insert(
        StageRole::Scorer,
        StageAgent::new(StageRole::Scorer, scorer_instruction(), scorer_bindings),
    );

    let stages = vec![
        PipelineStage {
            sender: StageRole::Entrypoint,
            recipient: StageRole::Fetcher,
            task_message: format!("Fetch the reviews for: {restaurant_query}"),
            max_turns,
        },
        PipelineStage {
            sender: StageRole::Fetcher,
            recipient: StageRole::Analyzer,
            task_message: "Analyze the reviews and extract food and customer service scores \
                           using the defined scale."
                .to_string(),
            max_turns,
        },
        PipelineStage {
            sender: StageRole::Analyzer,
            recipient: StageRole::Scorer,
            task_message: "Calculate the restaurant's final score from the extracted ratings."
                .to_string(),
            max_turns,
        },
    ];

    ReviewPipeline { agents, stages }
}

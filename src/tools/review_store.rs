use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::tools::{FETCH_REVIEWS_TOOL_NAME, Tool, ToolSchema};

/// Single-entry mapping from the queried restaurant name to its reviews in
/// corpus file order.
pub type ReviewBundle = BTreeMap<String, Vec<String>>;

/// Read-only view over the line-oriented review corpus. Each line has the
/// form `"<RestaurantName>.<free text review>"`. The file is opened per
/// fetch; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct ReviewStore {
    corpus_path: PathBuf,
}

impl ReviewStore {
    pub fn new(corpus_path: impl Into<PathBuf>) -> Self {
        Self {
            corpus_path: corpus_path.into(),
        }
    }

    /// Returns every review attributed to `restaurant_name`. A line belongs
    /// to the restaurant iff, after trimming surrounding whitespace, it
    /// starts with the literal name followed by a literal period. Matching
    /// is case-sensitive and unnormalized; the review text is everything
    /// after the first period following the prefix, trimmed. A missing
    /// corpus file or an unknown restaurant yields an empty review list,
    /// never an error.
    pub fn fetch(&self, restaurant_name: &str) -> ReviewBundle {
        let mut bundle = ReviewBundle::new();
        let reviews = match std::fs::read_to_string(&self.corpus_path) {
            Ok(content) => {
                let prefix = format!("{restaurant_name}.");
                content
                    .lines()
                    .map(str::trim)
                    .filter_map(|line| line.strip_prefix(&prefix))
                    .map(|review| review.trim().to_string())
                    .collect()
            }
            Err(err) => {
                tracing::debug!(
                    corpus = %self.corpus_path.display(),
                    error = %err,
                    "corpus not readable, treating as empty"
                );
                Vec::new()
            }
        };

        bundle.insert(restaurant_name.to_string(), reviews);
        bundle
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FetchReviewsArgs {
    /// Exact restaurant name as it appears in the corpus.
    pub restaurant_name: String,
}

/// Tool binding over [`ReviewStore::fetch`].
pub struct FetchReviewsTool {
    store: ReviewStore,
}

impl FetchReviewsTool {
    pub fn new(store: ReviewStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for FetchReviewsTool {
    fn name(&self) -> &str {
        FETCH_REVIEWS_TOOL_NAME
    }

    fn describe(&self) -> ToolSchema {
        ToolSchema {
            name: FETCH_REVIEWS_TOOL_NAME.to_string(),
            description: "Fetches all corpus reviews for a specific restaurant. \
                          Args: restaurant_name (required, exact literal name)."
                .to_string(),
            parameters: serde_json::to_value(schemars::schema_for!(FetchReviewsArgs))
                .unwrap_or_else(|_| json!({"type": "object"})),
        }
    }

    async fn invoke(&self, args: Value) -> Result<Value> {
        let args: FetchReviewsArgs = serde_json::from_value(args)
            .map_err(|err| anyhow::anyhow!("invalid fetch_restaurant_reviews args: {err}"))?;

        let bundle = self.store.fetch(&args.restaurant_name);
        tracing::info!(
            restaurant = %args.restaurant_name,
            reviews = bundle.values().map(Vec::len).sum::<usize>(),
            "fetched reviews"
        );
        Ok(serde_json::to_value(bundle)?)
    }
}

pub mod review_store;
pub mod score_kernel;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

pub const FETCH_REVIEWS_TOOL_NAME: &str = "fetch_restaurant_reviews";
pub const COMPUTE_SCORE_TOOL_NAME: &str = "calculate_overall_score";

/// Invocation schema announced to the inference service for one tool.
/// `parameters` is a JSON Schema object describing the argument shape.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A deterministic function an agent may invoke during its exchange, as
/// opposed to free-form inference-generated text.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn describe(&self) -> ToolSchema;

    async fn invoke(&self, args: Value) -> Result<Value>;
}

/// Per-agent tool binding table. A tool needs two separate bindings to work
/// end-to-end: a declaration (so the agent can announce it to the inference
/// service and decide to call it) and an execution binding (so the call
/// actually runs). `register` installs both; `declare` and `bind_execution`
/// install each on its own. Bindings are agent-scoped, never global.
#[derive(Clone, Default)]
pub struct ToolBindings {
    declared: Vec<ToolSchema>,
    executable: HashMap<String, Arc<dyn Tool>>,
}

impl ToolBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.declare(tool.clone());
        self.bind_execution(tool);
    }

    pub fn declare(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.describe();
        self.declared.retain(|existing| existing.name != schema.name);
        self.declared.push(schema);
    }

    pub fn bind_execution(&mut self, tool: Arc<dyn Tool>) {
        self.executable.insert(tool.name().to_string(), tool);
    }

    pub fn schemas(&self) -> &[ToolSchema] {
        &self.declared
    }

    /// Runs a declared tool. A call against a name with no execution binding
    /// resolves to an error payload rather than failing the exchange; the
    /// payload flows back to the inference service like any tool result.
    pub async fn invoke(&self, name: &str, args: Value) -> Value {
        let Some(tool) = self.executable.get(name) else {
            tracing::warn!(tool = name, "tool invoked without an execution binding");
            return json!({
                "status": "error",
                "code": "unbound_tool",
                "error": format!("tool '{name}' is not execution-bound for this agent"),
            });
        };

        match tool.invoke(args).await {
            Ok(payload) => payload,
            Err(err) => json!({
                "status": "error",
                "code": "tool_failed",
                "error": format!("{err:#}"),
            }),
        }
    }
}

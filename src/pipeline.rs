use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::inference::{ChatMessage, InferenceService};
use crate::telemetry::TelemetrySink;
use crate::tools::ToolBindings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageRole {
    Entrypoint,
    Fetcher,
    Analyzer,
    Scorer,
}

impl StageRole {
    pub fn label(self) -> &'static str {
        match self {
            StageRole::Entrypoint => "entrypoint",
            StageRole::Fetcher => "fetcher",
            StageRole::Analyzer => "analyzer",
            StageRole::Scorer => "scorer",
        }
    }
}

/// One pipeline participant: a role with its fixed instruction text and its
/// own tool bindings. Immutable once built. Agents hold no state between
/// runs; the only per-run state is the transcript, owned by the coordinator.
pub struct StageAgent {
    pub role: StageRole,
    pub instruction: String,
    pub bindings: ToolBindings,
}

impl StageAgent {
    pub fn new(role: StageRole, instruction: impl Into<String>, bindings: ToolBindings) -> Self {
        Self {
            role,
            instruction: instruction.into(),
            bindings,
        }
    }
}

/// One pre-wired stage-to-stage exchange: who hands off to whom, the task
/// message seeding the exchange, and the turn bound that caps it.
#[derive(Debug, Clone)]
pub struct PipelineStage {
    pub sender: StageRole,
    pub recipient: StageRole,
    pub task_message: String,
    pub max_turns: u32,
}

#[derive(Debug, Clone)]
pub struct TranscriptMessage {
    pub sender: String,
    pub content: String,
}

/// Ordered record of one stage exchange. Owned by the coordinator for the
/// duration of a run and discarded afterwards; nothing is persisted.
#[derive(Debug, Clone)]
pub struct StageTranscript {
    pub sender: StageRole,
    pub recipient: StageRole,
    pub messages: Vec<TranscriptMessage>,
}

impl StageTranscript {
    pub fn last_message(&self) -> Option<&TranscriptMessage> {
        self.messages.last()
    }

    fn push(&mut self, sender: impl Into<String>, content: impl Into<String>) {
        self.messages.push(TranscriptMessage {
            sender: sender.into(),
            content: content.into(),
        });
    }
}

/// The fixed agent set plus the ordered stage list wiring them together.
pub struct ReviewPipeline {
    pub agents: HashMap<StageRole, StageAgent>,
    pub stages: Vec<PipelineStage>,
}

/// Drives the linear stage sequence: strictly in order, one bounded
/// exchange per stage, the previous stage's output carried into the next
/// stage's task message. Intermediate output is never validated against a
/// schema; malformed output flows forward unchanged.
pub struct PipelineCoordinator<'a> {
    inference: &'a dyn InferenceService,
    telemetry: &'a TelemetrySink,
}

impl<'a> PipelineCoordinator<'a> {
    pub fn new(inference: &'a dyn InferenceService, telemetry: &'a TelemetrySink) -> Self {
        Self {
            inference,
            telemetry,
        }
    }

    /// Produces exactly one transcript per stage, in execution order.
    pub async fn run(&self, pipeline: &ReviewPipeline) -> Result<Vec<StageTranscript>> {
        let mut transcripts = Vec::with_capacity(pipeline.stages.len());
        let mut carried: Option<String> = None;

        for stage in &pipeline.stages {
            let agent = pipeline.agents.get(&stage.recipient).with_context(|| {
                format!(
                    "pipeline stage recipient '{}' has no agent",
                    stage.recipient.label()
                )
            })?;

            let task = compose_task(&stage.task_message, carried.as_deref());
            self.telemetry.emit(
                "pipeline.stage.started",
                json!({
                    "sender": stage.sender.label(),
                    "recipient": stage.recipient.label(),
                    "max_turns": stage.max_turns,
                }),
            );

            let transcript = self.run_exchange(stage, agent, task).await?;
            self.telemetry.emit(
                "pipeline.stage.completed",
                json!({
                    "recipient": stage.recipient.label(),
                    "messages": transcript.messages.len(),
                }),
            );

            carried = transcript
                .last_message()
                .map(|message| message.content.clone());
            transcripts.push(transcript);
        }

        Ok(transcripts)
    }

    /// One turn-bounded exchange against the recipient agent. A tool-call
    /// reply is executed through the agent's bindings and the result fed
    /// back before the next turn; a plain text reply is the natural
    /// completion signal. The bound guarantees termination either way.
    async fn run_exchange(
        &self,
        stage: &PipelineStage,
        agent: &StageAgent,
        task: String,
    ) -> Result<StageTranscript> {
        let mut wire = vec![
            ChatMessage::system(agent.instruction.clone()),
            ChatMessage::user(task.clone()),
        ];
        let mut transcript = StageTranscript {
            sender: stage.sender,
            recipient: stage.recipient,
            messages: Vec::new(),
        };
        transcript.push(stage.sender.label(), task);

        for turn in 0..stage.max_turns {
            let reply = self
                .inference
                .complete(&wire, agent.bindings.schemas())
                .await
                .with_context(|| {
                    format!("stage '{}' inference turn failed", agent.role.label())
                })?;

            if let Some(calls) = reply.tool_calls.as_ref().filter(|calls| !calls.is_empty()) {
                let calls = calls.clone();
                wire.push(reply.clone());
                for call in calls {
                    self.telemetry
                        .emit("tool.requested", json!({"tool": call.function.name}));
                    let payload = match call.parsed_arguments() {
                        Ok(args) => agent.bindings.invoke(&call.function.name, args).await,
                        Err(err) => json!({
                            "status": "error",
                            "code": "invalid_args",
                            "error": format!("{err:#}"),
                        }),
                    };

                    let failed = payload
                        .get("status")
                        .and_then(Value::as_str)
                        .is_some_and(|status| status == "error");
                    self.telemetry.emit(
                        if failed { "tool.failed" } else { "tool.succeeded" },
                        json!({"tool": call.function.name}),
                    );

                    transcript.push(format!("tool:{}", call.function.name), payload.to_string());
                    wire.push(ChatMessage::tool_result(call.id.clone(), &payload));
                }
                continue;
            }

            if let Some(text) = reply.text_content() {
                let text = text.to_string();
                transcript.push(agent.role.label(), text.clone());
                wire.push(ChatMessage::assistant(text));
                return Ok(transcript);
            }

            tracing::debug!(
                stage = agent.role.label(),
                turn,
                "inference reply carried neither text nor tool calls"
            );
        }

        tracing::warn!(
            stage = agent.role.label(),
            max_turns = stage.max_turns,
            "turn bound reached before a completion signal"
        );
        Ok(transcript)
    }
}

fn compose_task(task_message: &str, carried: Option<&str>) -> String {
    match carried {
        Some(previous) if !previous.trim().is_empty() => {
            format!("{task_message}\n\nContext from the previous stage:\n{previous}")
        }
        _ => task_message.to_string(),
    }
}

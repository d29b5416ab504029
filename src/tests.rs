use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::tempdir;

use crate::cli::*;
use crate::config::*;
use crate::error::*;
use crate::extract::*;
use crate::inference::*;
use crate::pipeline::*;
use crate::provider::*;
use crate::roles::*;
use crate::telemetry::*;
use crate::tools::review_store::*;
use crate::tools::score_kernel::*;
use crate::tools::*;

fn base_cfg() -> RuntimeConfig {
    RuntimeConfig {
        profile: "default".to_string(),
        config_path: ".savor/config.toml".to_string(),
        provider: Provider::Auto,
        model: None,
        corpus_path: "reviews.txt".to_string(),
        max_turns: STAGE_MAX_TURNS,
        request_timeout_secs: 120,
        telemetry_enabled: false,
        telemetry_path: ".savor/test-telemetry.jsonl".to_string(),
    }
}

fn test_telemetry(cfg: &RuntimeConfig) -> TelemetrySink {
    TelemetrySink::new(cfg, "test".to_string())
}

fn base_cli(profile: &str, config_path: &str) -> Cli {
    Cli {
        provider: Provider::Auto,
        model: None,
        profile: profile.to_string(),
        config_path: config_path.to_string(),
        corpus_path: None,
        request_timeout_secs: None,
        telemetry_enabled: None,
        telemetry_path: None,
        log_filter: "error".to_string(),
        command: Commands::Doctor,
    }
}

/// Deterministic inference fake: pops one scripted reply per completion
/// call, in order, across every stage of a run.
struct ScriptedInference {
    replies: Mutex<VecDeque<ChatMessage>>,
}

impl ScriptedInference {
    fn new(replies: Vec<ChatMessage>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }
}

#[async_trait]
impl InferenceService for ScriptedInference {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolSchema],
    ) -> Result<ChatMessage> {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted inference ran out of replies"))
    }
}

fn text_reply(text: &str) -> ChatMessage {
    ChatMessage::assistant(text)
}

fn tool_call_reply(tool_name: &str, args: Value) -> ChatMessage {
    ChatMessage {
        role: "assistant".to_string(),
        content: None,
        tool_calls: Some(vec![ToolCall {
            id: format!("call-{tool_name}"),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: tool_name.to_string(),
                arguments: args.to_string(),
            },
        }]),
        tool_call_id: None,
    }
}

fn write_corpus(content: &str) -> (tempfile::TempDir, ReviewStore) {
    let dir = tempdir().expect("temp directory should create");
    let path = dir.path().join("reviews.txt");
    std::fs::write(&path, content).expect("corpus should write");
    let store = ReviewStore::new(&path);
    (dir, store)
}

fn scorer_transcript(final_message: &str) -> StageTranscript {
    StageTranscript {
        sender: StageRole::Analyzer,
        recipient: StageRole::Scorer,
        messages: vec![TranscriptMessage {
            sender: "scorer".to_string(),
            content: final_message.to_string(),
        }],
    }
}

// --- score kernel ---

#[test]
fn score_formula_matches_reference_values() {
    assert_eq!(
        compute("Bob's", &[3], &[4]),
        ScoreResult {
            restaurant_name: "Bob's".to_string(),
            value: 5.367,
        }
    );

    let result = compute("Bob's", &[4, 5], &[5, 4]);
    assert_eq!(result.value, 8.472);
}

#[test]
fn score_stays_within_formula_bounds() {
    let worst = compute("X", &[1, 1, 1], &[1, 1, 1]);
    assert_eq!(worst.value, 0.894);

    let best = compute("X", &[5, 5], &[5, 5]);
    assert_eq!(best.value, 10.0);
}

#[test]
fn malformed_score_input_falls_back_to_zero() {
    assert_eq!(compute("X", &[], &[]).value, 0.0);
    assert_eq!(compute("X", &[1, 2], &[1]).value, 0.0);
    assert_eq!(compute("X", &[3], &[]).value, 0.0);
    assert_eq!(compute("X", &[3], &[-4]).value, 0.0);
}

#[test]
fn rounding_rounds_half_up_at_the_tie() {
    // 0.0625 and 0.1875 scale to exactly 62.5 and 187.5.
    assert_eq!(round_to_3_places(0.0625), 0.063);
    assert_eq!(round_to_3_places(0.1875), 0.188);
    assert_eq!(round_to_3_places(5.366563145999495), 5.367);
}

#[tokio::test]
async fn score_tool_emits_name_to_value_payload() {
    let payload = ComputeScoreTool
        .invoke(json!({
            "restaurant_name": "Bob's",
            "food_scores": [3],
            "customer_service_scores": [4],
        }))
        .await
        .expect("score tool should invoke");
    assert_eq!(payload, json!({"Bob's": 5.367}));
}

// --- review store ---

#[test]
fn fetch_matches_exact_prefix_only() {
    let (_dir, store) = write_corpus("Bob's. Great fries.\nBobby's. Bad service.\n");

    let bundle = store.fetch("Bob's");
    assert_eq!(bundle.get("Bob's"), Some(&vec!["Great fries.".to_string()]));

    // "Bob" alone lacks the literal period after the name.
    let bundle = store.fetch("Bob");
    assert_eq!(bundle.get("Bob"), Some(&Vec::new()));
}

#[test]
fn fetch_preserves_file_order_and_trims() {
    let (_dir, store) = write_corpus(
        "  Bob's.   The burgers were awesome.  \nOther. Irrelevant.\nBob's. Staff was friendly.\n",
    );

    let bundle = store.fetch("Bob's");
    assert_eq!(
        bundle.get("Bob's"),
        Some(&vec![
            "The burgers were awesome.".to_string(),
            "Staff was friendly.".to_string(),
        ])
    );
}

#[test]
fn fetch_splits_at_first_period_after_the_prefix() {
    let (_dir, store) = write_corpus("Paris 6. Food was amazing. Service too.\n");
    let bundle = store.fetch("Paris 6");
    assert_eq!(
        bundle.get("Paris 6"),
        Some(&vec!["Food was amazing. Service too.".to_string()])
    );

    // A name that is a prefix of another entity does not match without its
    // own literal period.
    let bundle = store.fetch("Paris");
    assert_eq!(bundle.get("Paris"), Some(&Vec::new()));
}

#[test]
fn fetch_unknown_entity_and_missing_file_are_soft() {
    let (_dir, store) = write_corpus("Bob's. Great fries.\n");
    assert_eq!(store.fetch("Unknown").get("Unknown"), Some(&Vec::new()));

    let missing = ReviewStore::new("/nonexistent/savor-reviews.txt");
    assert_eq!(missing.fetch("Unknown").get("Unknown"), Some(&Vec::new()));
}

#[tokio::test]
async fn fetch_tool_rejects_malformed_args() {
    let (_dir, store) = write_corpus("Bob's. Great fries.\n");
    let err = FetchReviewsTool::new(store)
        .invoke(json!({"name": "Bob's"}))
        .await
        .expect_err("missing restaurant_name should be rejected");
    assert!(err.to_string().contains("fetch_restaurant_reviews"));
}

// --- tool bindings ---

#[tokio::test]
async fn declared_but_unbound_tool_yields_error_payload() {
    let (_dir, store) = write_corpus("Bob's. Great fries.\n");
    let tool = std::sync::Arc::new(FetchReviewsTool::new(store));

    let mut bindings = ToolBindings::new();
    bindings.declare(tool);
    assert_eq!(bindings.schemas().len(), 1);

    let payload = bindings
        .invoke(FETCH_REVIEWS_TOOL_NAME, json!({"restaurant_name": "Bob's"}))
        .await;
    assert_eq!(payload["code"], json!("unbound_tool"));
}

#[tokio::test]
async fn bindings_are_agent_scoped() {
    let (_dir, store) = write_corpus("Bob's. Great fries.\n");
    let tool = std::sync::Arc::new(FetchReviewsTool::new(store));

    let mut fetcher = ToolBindings::new();
    fetcher.register(tool);
    let scorer = ToolBindings::new();

    let payload = fetcher
        .invoke(FETCH_REVIEWS_TOOL_NAME, json!({"restaurant_name": "Bob's"}))
        .await;
    assert_eq!(payload, json!({"Bob's": ["Great fries."]}));

    let payload = scorer
        .invoke(FETCH_REVIEWS_TOOL_NAME, json!({"restaurant_name": "Bob's"}))
        .await;
    assert_eq!(payload["code"], json!("unbound_tool"));
}

// --- result extraction ---

#[test]
fn extractor_emits_canonical_sentence() {
    let transcripts = vec![scorer_transcript("The average rating of Bob's is 7.123.")];
    assert_eq!(
        extract_answer(&transcripts, "What is the score of Bob's?"),
        "The average rating of Bob's is 7.123."
    );
}

#[test]
fn extractor_overrides_nonstandard_final_phrasing() {
    let transcripts = vec![scorer_transcript("Final computed value: 7.123 (three decimals)")];
    assert_eq!(
        extract_answer(&transcripts, "What is the overall score for Paris 6?"),
        "The average rating of Paris 6 is 7.123."
    );
}

#[test]
fn extractor_falls_back_to_raw_message() {
    let transcripts = vec![scorer_transcript("I could not find any reviews.")];
    assert_eq!(
        extract_answer(&transcripts, "What is the score of Bob's?"),
        "I could not find any reviews."
    );

    // A two-decimal score does not satisfy the three-decimal pattern.
    let transcripts = vec![scorer_transcript("The rating is 7.12.")];
    assert_eq!(
        extract_answer(&transcripts, "What is the score of Bob's?"),
        "The rating is 7.12."
    );

    // No recoverable entity in the query.
    let transcripts = vec![scorer_transcript("The rating is 7.123.")];
    assert_eq!(
        extract_answer(&transcripts, "Tell me about Bob's"),
        "The rating is 7.123."
    );
}

#[test]
fn extractor_notices_an_empty_run() {
    assert_eq!(
        extract_answer(&[], "What is the score of Bob's?"),
        UNPROCESSED_NOTICE
    );

    let empty = StageTranscript {
        sender: StageRole::Analyzer,
        recipient: StageRole::Scorer,
        messages: Vec::new(),
    };
    assert_eq!(
        extract_answer(&[empty], "What is the score of Bob's?"),
        UNPROCESSED_NOTICE
    );
}

// --- pipeline coordinator ---

#[tokio::test]
async fn run_produces_one_transcript_per_stage_in_order() {
    let cfg = base_cfg();
    let telemetry = test_telemetry(&cfg);
    let (_dir, store) = write_corpus("Bob's. Great fries.\n");
    let pipeline = build_review_pipeline("What is the score of Bob's?", store, cfg.max_turns);

    let inference = ScriptedInference::new(vec![
        text_reply("reviews: Great fries."),
        text_reply("food_scores: [4] customer_service_scores: [3]"),
        text_reply("The average rating of Bob's is 5.060."),
    ]);

    let transcripts = PipelineCoordinator::new(&inference, &telemetry)
        .run(&pipeline)
        .await
        .expect("pipeline should run");

    assert_eq!(transcripts.len(), 3);
    let recipients = transcripts
        .iter()
        .map(|transcript| transcript.recipient)
        .collect::<Vec<StageRole>>();
    assert_eq!(
        recipients,
        vec![StageRole::Fetcher, StageRole::Analyzer, StageRole::Scorer]
    );
    assert_eq!(
        transcripts[2].last_message().expect("final message").content,
        "The average rating of Bob's is 5.060."
    );
}

#[tokio::test]
async fn exchange_executes_tool_calls_and_feeds_results_back() {
    let cfg = base_cfg();
    let telemetry = test_telemetry(&cfg);
    let (_dir, store) = write_corpus("Bob's. Great fries.\n");

    let mut bindings = ToolBindings::new();
    bindings.register(std::sync::Arc::new(FetchReviewsTool::new(store)));
    let mut agents = HashMap::new();
    agents.insert(
        StageRole::Fetcher,
        StageAgent::new(StageRole::Fetcher, fetcher_instruction("Bob's"), bindings),
    );
    let pipeline = ReviewPipeline {
        agents,
        stages: vec![PipelineStage {
            sender: StageRole::Entrypoint,
            recipient: StageRole::Fetcher,
            task_message: "Fetch the reviews for: Bob's".to_string(),
            max_turns: cfg.max_turns,
        }],
    };

    let inference = ScriptedInference::new(vec![
        tool_call_reply(FETCH_REVIEWS_TOOL_NAME, json!({"restaurant_name": "Bob's"})),
        text_reply("Retrieved 1 review for Bob's."),
    ]);

    let transcripts = PipelineCoordinator::new(&inference, &telemetry)
        .run(&pipeline)
        .await
        .expect("pipeline should run");

    let messages = &transcripts[0].messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].sender, format!("tool:{FETCH_REVIEWS_TOOL_NAME}"));
    assert!(messages[1].content.contains("Great fries."));
    assert_eq!(messages[2].sender, "fetcher");
    assert_eq!(messages[2].content, "Retrieved 1 review for Bob's.");
}

#[tokio::test]
async fn exchange_terminates_at_the_turn_bound() {
    let cfg = base_cfg();
    let telemetry = test_telemetry(&cfg);
    let (_dir, store) = write_corpus("Bob's. Great fries.\n");

    let mut bindings = ToolBindings::new();
    bindings.register(std::sync::Arc::new(FetchReviewsTool::new(store)));
    let mut agents = HashMap::new();
    agents.insert(
        StageRole::Fetcher,
        StageAgent::new(StageRole::Fetcher, fetcher_instruction("Bob's"), bindings),
    );
    let pipeline = ReviewPipeline {
        agents,
        stages: vec![PipelineStage {
            sender: StageRole::Entrypoint,
            recipient: StageRole::Fetcher,
            task_message: "Fetch the reviews for: Bob's".to_string(),
            max_turns: 3,
        }],
    };

    // A role contract that is never followed: every turn asks for another
    // tool call and no completion text ever arrives.
    let inference = ScriptedInference::new(vec![
        tool_call_reply(FETCH_REVIEWS_TOOL_NAME, json!({"restaurant_name": "Bob's"})),
        tool_call_reply(FETCH_REVIEWS_TOOL_NAME, json!({"restaurant_name": "Bob's"})),
        tool_call_reply(FETCH_REVIEWS_TOOL_NAME, json!({"restaurant_name": "Bob's"})),
    ]);

    let transcripts = PipelineCoordinator::new(&inference, &telemetry)
        .run(&pipeline)
        .await
        .expect("bounded exchange should still complete");

    assert_eq!(transcripts.len(), 1);
    // Task message plus exactly max_turns tool results; no completion text.
    assert_eq!(transcripts[0].messages.len(), 4);
    assert!(
        transcripts[0]
            .last_message()
            .expect("last message")
            .sender
            .starts_with("tool:")
    );
}

#[tokio::test]
async fn stage_output_is_carried_into_the_next_task() {
    let cfg = base_cfg();
    let telemetry = test_telemetry(&cfg);

    let mut agents = HashMap::new();
    agents.insert(
        StageRole::Fetcher,
        StageAgent::new(StageRole::Fetcher, "first", ToolBindings::new()),
    );
    agents.insert(
        StageRole::Analyzer,
        StageAgent::new(StageRole::Analyzer, "second", ToolBindings::new()),
    );
    let pipeline = ReviewPipeline {
        agents,
        stages: vec![
            PipelineStage {
                sender: StageRole::Entrypoint,
                recipient: StageRole::Fetcher,
                task_message: "first task".to_string(),
                max_turns: cfg.max_turns,
            },
            PipelineStage {
                sender: StageRole::Fetcher,
                recipient: StageRole::Analyzer,
                task_message: "second task".to_string(),
                max_turns: cfg.max_turns,
            },
        ],
    };

    let inference = ScriptedInference::new(vec![
        text_reply("STAGE-ONE-OUTPUT"),
        text_reply("done"),
    ]);

    let transcripts = PipelineCoordinator::new(&inference, &telemetry)
        .run(&pipeline)
        .await
        .expect("pipeline should run");

    let seeded = &transcripts[1].messages[0];
    assert_eq!(seeded.sender, "fetcher");
    assert_eq!(
        seeded.content,
        "second task\n\nContext from the previous stage:\nSTAGE-ONE-OUTPUT"
    );
}

#[tokio::test]
async fn full_pipeline_run_yields_the_canonical_answer() {
    let cfg = base_cfg();
    let telemetry = test_telemetry(&cfg);
    let (_dir, store) = write_corpus(
        "Bob's. The burgers were awesome and the staff was good.\n\
         Bob's. Average food, enjoyable service.\n",
    );
    let query = "What is the score of Bob's?";
    let pipeline = build_review_pipeline(query, store, cfg.max_turns);

    let inference = ScriptedInference::new(vec![
        tool_call_reply(FETCH_REVIEWS_TOOL_NAME, json!({"restaurant_name": "Bob's"})),
        text_reply(
            "Reviews for Bob's: The burgers were awesome and the staff was good. \
             Average food, enjoyable service.",
        ),
        text_reply("food_scores: [5,3] customer_service_scores: [4,4]"),
        tool_call_reply(
            COMPUTE_SCORE_TOOL_NAME,
            json!({
                "restaurant_name": "Bob's",
                "food_scores": [5, 3],
                "customer_service_scores": [4, 4],
            }),
        ),
        text_reply("The average rating of Bob's is 7.155."),
    ]);

    let transcripts = PipelineCoordinator::new(&inference, &telemetry)
        .run(&pipeline)
        .await
        .expect("pipeline should run");

    assert_eq!(transcripts.len(), 3);
    let score_payload = transcripts[2]
        .messages
        .iter()
        .find(|message| message.sender == format!("tool:{COMPUTE_SCORE_TOOL_NAME}"))
        .expect("score tool result should be in the transcript");
    assert!(score_payload.content.contains("7.155"));

    assert_eq!(
        extract_answer(&transcripts, query),
        "The average rating of Bob's is 7.155."
    );
}

#[tokio::test]
async fn inference_failure_surfaces_as_a_stage_error() {
    let cfg = base_cfg();
    let telemetry = test_telemetry(&cfg);
    let (_dir, store) = write_corpus("Bob's. Great fries.\n");
    let pipeline = build_review_pipeline("What is the score of Bob's?", store, cfg.max_turns);

    let inference = ScriptedInference::new(Vec::new());
    let err = PipelineCoordinator::new(&inference, &telemetry)
        .run(&pipeline)
        .await
        .expect_err("an exhausted inference service should fail the stage");
    assert!(err.to_string().contains("fetcher"));
}

// --- configuration ---

#[test]
fn missing_config_file_resolves_to_defaults() {
    let cli = base_cli("default", "/nonexistent/savor-config.toml");
    let profiles = load_profiles(&cli.config_path).expect("missing config should be implicit");
    let cfg = resolve_runtime_config(&cli, &profiles).expect("config should resolve");

    assert_eq!(cfg.corpus_path, DEFAULT_CORPUS_PATH);
    assert_eq!(cfg.max_turns, STAGE_MAX_TURNS);
    assert_eq!(cfg.request_timeout_secs, 120);
    assert!(cfg.telemetry_enabled);
    assert_eq!(cfg.telemetry_path, DEFAULT_TELEMETRY_PATH);
}

#[test]
fn unknown_profile_is_rejected_with_available_names() {
    let dir = tempdir().expect("temp directory should create");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[profiles.prod]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\n",
    )
    .expect("config should write");

    let cli = base_cli("staging", config_path.to_str().expect("utf-8 path"));
    let profiles = load_profiles(&cli.config_path).expect("config should load");
    let err = resolve_runtime_config(&cli, &profiles).expect_err("unknown profile should fail");
    assert!(err.to_string().contains("staging"));
    assert!(err.to_string().contains("prod"));
}

#[test]
fn cli_values_take_precedence_over_profile_values() {
    let dir = tempdir().expect("temp directory should create");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[profiles.prod]\n\
         provider = \"groq\"\n\
         model = \"llama-3.3-70b-versatile\"\n\
         corpus_path = \"data/reviews.txt\"\n\
         max_turns = 5\n",
    )
    .expect("config should write");

    let mut cli = base_cli("prod", config_path.to_str().expect("utf-8 path"));
    cli.model = Some("gpt-4o-mini".to_string());

    let profiles = load_profiles(&cli.config_path).expect("config should load");
    let cfg = resolve_runtime_config(&cli, &profiles).expect("config should resolve");

    assert_eq!(cfg.provider, Provider::Groq);
    assert_eq!(cfg.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(cfg.corpus_path, "data/reviews.txt");
    assert_eq!(cfg.max_turns, 5);
}

#[test]
fn unknown_profile_fields_are_rejected() {
    let dir = tempdir().expect("temp directory should create");
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[profiles.default]\nmodle = \"typo\"\n")
        .expect("config should write");

    let err = load_profiles(config_path.to_str().expect("utf-8 path"))
        .expect_err("unknown fields should fail");
    assert!(err.to_string().contains("invalid profile configuration"));
}

// --- providers and errors ---

#[test]
fn model_validation_follows_provider_conventions() {
    assert!(validate_model_for_provider(Provider::Openai, "gpt-4o-mini").is_ok());
    assert!(validate_model_for_provider(Provider::Openai, "llama3.1").is_err());
    assert!(validate_model_for_provider(Provider::Groq, "llama-3.3-70b-versatile").is_ok());
    assert!(validate_model_for_provider(Provider::Ollama, "llama3.1").is_ok());
    assert!(validate_model_for_provider(Provider::Ollama, "  ").is_err());
}

#[test]
fn errors_map_to_actionable_categories() {
    let provider = anyhow::anyhow!("OPENAI_API_KEY is required for OpenAI provider");
    assert_eq!(categorize_error(&provider), ErrorCategory::Provider);

    let input = anyhow::anyhow!("profile 'staging' not found in '.savor/config.toml'");
    assert_eq!(categorize_error(&input), ErrorCategory::Input);

    let pipeline = anyhow::anyhow!("tool 'x' is not execution-bound for this agent");
    assert_eq!(categorize_error(&pipeline), ErrorCategory::Pipeline);

    let formatted = format_cli_error(&provider);
    assert!(formatted.starts_with("[PROVIDER]"));
    assert!(formatted.contains("Hint:"));
}

// --- telemetry ---

#[test]
fn telemetry_summary_counts_pipeline_events() {
    let lines = vec![
        r#"{"ts_unix_ms":1,"event":"pipeline.stage.started","run_id":"run-1","command":"ask"}"#
            .to_string(),
        r#"{"ts_unix_ms":2,"event":"tool.requested","run_id":"run-1","command":"ask"}"#.to_string(),
        r#"{"ts_unix_ms":3,"event":"tool.succeeded","run_id":"run-1","command":"ask"}"#.to_string(),
        r#"{"ts_unix_ms":4,"event":"pipeline.stage.completed","run_id":"run-1","command":"ask"}"#
            .to_string(),
        r#"{"ts_unix_ms":5,"event":"command.completed","run_id":"run-2","command":"ask"}"#
            .to_string(),
        "not json".to_string(),
    ];

    let summary = summarize_telemetry_lines(lines, 5000);
    assert_eq!(summary.total_lines, 6);
    assert_eq!(summary.parsed_events, 5);
    assert_eq!(summary.parse_errors, 1);
    assert_eq!(summary.unique_runs.len(), 2);
    assert_eq!(summary.stages_started, 1);
    assert_eq!(summary.stages_completed, 1);
    assert_eq!(summary.tool_requested, 1);
    assert_eq!(summary.tool_succeeded, 1);
    assert_eq!(summary.command_completed, 1);
    assert_eq!(summary.command_counts.get("ask"), Some(&5));
    assert_eq!(summary.last_event_ts_unix_ms, Some(5));
}

#[test]
fn telemetry_sink_appends_jsonl_events() {
    let dir = tempdir().expect("temp directory should create");
    let mut cfg = base_cfg();
    cfg.telemetry_enabled = true;
    cfg.telemetry_path = dir
        .path()
        .join("events.jsonl")
        .to_string_lossy()
        .to_string();

    let sink = TelemetrySink::new(&cfg, "ask".to_string());
    sink.emit("pipeline.stage.started", json!({"recipient": "fetcher"}));
    sink.emit("command.completed", json!({}));

    let content = std::fs::read_to_string(&cfg.telemetry_path).expect("events should be written");
    let lines = content.lines().collect::<Vec<&str>>();
    assert_eq!(lines.len(), 2);
    let first: Value = serde_json::from_str(lines[0]).expect("event should be json");
    assert_eq!(first["event"], json!("pipeline.stage.started"));
    assert_eq!(first["recipient"], json!("fetcher"));
    assert_eq!(first["run_id"], json!(sink.run_id));
}

// --- cli ---

#[test]
fn command_labels_are_stable() {
    assert_eq!(command_label(&Commands::Doctor), "doctor");
    assert_eq!(
        command_label(&Commands::Ask {
            query: vec!["q".to_string()],
        }),
        "ask"
    );
    assert_eq!(
        command_label(&Commands::Telemetry {
            command: TelemetryCommands::Report {
                path: None,
                limit: 10,
            },
        }),
        "telemetry.report"
    );
}

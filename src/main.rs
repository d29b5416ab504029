use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing::level_filters::LevelFilter;

use savor_cli::cli::{Cli, Commands, ProfileCommands, TelemetryCommands, command_label};
use savor_cli::config::{RuntimeConfig, load_profiles, resolve_runtime_config};
use savor_cli::doctor::run_doctor;
use savor_cli::error::{categorize_error, format_cli_error};
use savor_cli::extract::extract_answer;
use savor_cli::pipeline::PipelineCoordinator;
use savor_cli::profiles::{run_profiles_list, run_profiles_show};
use savor_cli::provider::resolve_inference;
use savor_cli::roles::build_review_pipeline;
use savor_cli::telemetry::{TelemetrySink, run_telemetry_report};
use savor_cli::tools::review_store::ReviewStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(err) = run_cli(cli).await {
        eprintln!("{}", format_cli_error(&err));
        tracing::error!(category = %categorize_error(&err).code(), error = %err, "command failed");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_cli(cli: Cli) -> Result<()> {
    init_tracing(&cli.log_filter)?;
    let profiles = load_profiles(&cli.config_path)?;
    let cfg = resolve_runtime_config(&cli, &profiles)?;
    let telemetry = TelemetrySink::new(&cfg, command_label(&cli.command));

    let outcome = match &cli.command {
        Commands::Ask { query } => run_ask(&cfg, &telemetry, query.join(" ")).await,
        Commands::Doctor => run_doctor(&cfg),
        Commands::Profiles { command } => match command {
            ProfileCommands::List => run_profiles_list(&profiles, &cfg),
            ProfileCommands::Show => run_profiles_show(&cfg),
        },
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { path, limit } => {
                run_telemetry_report(&cfg, path.clone(), *limit)
            }
        },
    };

    match &outcome {
        Ok(()) => telemetry.emit("command.completed", json!({})),
        Err(err) => telemetry.emit("command.failed", json!({"error": format!("{err:#}")})),
    }

    outcome
}

async fn run_ask(cfg: &RuntimeConfig, telemetry: &TelemetrySink, query: String) -> Result<()> {
    let (inference, resolved_provider, model_name) = resolve_inference(cfg)?;
    telemetry.emit(
        "model.resolved",
        json!({
            "provider": format!("{:?}", resolved_provider).to_ascii_lowercase(),
            "model": model_name.clone(),
        }),
    );
    tracing::info!(provider = ?resolved_provider, model = %inference.model(), "Using model");

    let store = ReviewStore::new(&cfg.corpus_path);
    let pipeline = build_review_pipeline(&query, store, cfg.max_turns);
    let coordinator = PipelineCoordinator::new(inference.as_ref(), telemetry);
    let transcripts = coordinator.run(&pipeline).await?;

    println!("{}", extract_answer(&transcripts, &query));
    Ok(())
}

fn init_tracing(log_filter: &str) -> Result<()> {
    let level = log_filter
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Auto,
    Openai,
    Groq,
    Ollama,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    #[command(about = "List configured profiles and highlight the active profile")]
    List,
    #[command(about = "Show the active profile's resolved runtime settings")]
    Show,
}

#[derive(Debug, Subcommand)]
pub enum TelemetryCommands {
    #[command(about = "Summarize telemetry events from a JSONL stream")]
    Report {
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 5000)]
        limit: usize,
    },
}

const CLI_EXAMPLES: &str = "Examples:\n\
  savor-cli ask \"What is the score of Bob's?\"\n\
  savor-cli --provider openai --model gpt-4o-mini ask \"What is the overall score for Paris 6?\"\n\
  savor-cli --corpus-path data/reviews.txt ask \"What is the score of KFC?\"\n\
  savor-cli doctor\n\
  savor-cli profiles list\n\
  savor-cli telemetry report --limit 2000\n\
\n\
Switching behavior:\n\
  - Use --provider/--model to switch runtime model selection per invocation.\n\
  - Use --profile <name> to apply a profile from .savor/config.toml.";

#[derive(Debug, Parser)]
#[command(name = "savor-cli")]
#[command(about = "Restaurant review scoring through a three-stage agent pipeline")]
#[command(after_long_help = CLI_EXAMPLES)]
pub struct Cli {
    #[arg(long, env = "SAVOR_PROVIDER", value_enum, default_value_t = Provider::Auto)]
    pub provider: Provider,

    #[arg(long, env = "SAVOR_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "SAVOR_PROFILE", default_value = "default")]
    pub profile: String,

    #[arg(long, env = "SAVOR_CONFIG", default_value = ".savor/config.toml")]
    pub config_path: String,

    #[arg(long, env = "SAVOR_CORPUS_PATH")]
    pub corpus_path: Option<String>,

    #[arg(long, env = "SAVOR_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, env = "SAVOR_TELEMETRY_ENABLED", action = clap::ArgAction::Set)]
    pub telemetry_enabled: Option<bool>,

    #[arg(long, env = "SAVOR_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    #[arg(long, env = "RUST_LOG", default_value = "error")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Answer a restaurant score query and print the final answer")]
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },
    #[command(about = "Validate provider environment and corpus configuration")]
    Doctor,
    #[command(about = "Inspect profile configuration and active resolved profile state")]
    Profiles {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    #[command(about = "Telemetry utilities and reporting")]
    Telemetry {
        #[command(subcommand)]
        command: TelemetryCommands,
    },
}

pub fn command_label(command: &Commands) -> String {
    match command {
        Commands::Ask { .. } => "ask".to_string(),
        Commands::Doctor => "doctor".to_string(),
        Commands::Profiles { command } => match command {
            ProfileCommands::List => "profiles.list".to_string(),
            ProfileCommands::Show => "profiles.show".to_string(),
        },
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { .. } => "telemetry.report".to_string(),
        },
    }
}

use anyhow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Provider,
    Corpus,
    Pipeline,
    Input,
    Internal,
}

impl ErrorCategory {
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::Provider => "PROVIDER",
            ErrorCategory::Corpus => "CORPUS",
            ErrorCategory::Pipeline => "PIPELINE",
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Internal => "INTERNAL",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ErrorCategory::Provider => {
                "Set provider credentials (for example OPENAI_API_KEY) or run with --provider ollama."
            }
            ErrorCategory::Corpus => {
                "Check --corpus-path/SAVOR_CORPUS_PATH and confirm the review file is readable."
            }
            ErrorCategory::Pipeline => {
                "Retry with RUST_LOG=info for stage/tool logs, then inspect the telemetry report."
            }
            ErrorCategory::Input => "Run savor-cli --help and correct command arguments.",
            ErrorCategory::Internal => {
                "Retry with RUST_LOG=debug. If it persists, capture logs and open an issue."
            }
        }
    }
}

pub fn categorize_error(err: &anyhow::Error) -> ErrorCategory {
    let msg = format!("{err:#}").to_ascii_lowercase();

    if msg.contains("api_key")
        || msg.contains("no provider could be auto-detected")
        || msg.contains("provider")
        || msg.contains("inference")
    {
        return ErrorCategory::Provider;
    }

    if msg.contains("invalid value")
        || msg.contains("unknown argument")
        || msg.contains("profile")
        || msg.contains("query")
    {
        return ErrorCategory::Input;
    }

    if msg.contains("corpus") || msg.contains("review file") {
        return ErrorCategory::Corpus;
    }

    if msg.contains("stage") || msg.contains("tool") || msg.contains("pipeline") {
        return ErrorCategory::Pipeline;
    }

    ErrorCategory::Internal
}

pub fn format_cli_error(err: &anyhow::Error) -> String {
    let category = categorize_error(err);
    format!("[{}] {}\nHint: {}", category.code(), err, category.hint())
}

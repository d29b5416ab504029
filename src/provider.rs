use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::Provider;
use crate::config::RuntimeConfig;
use crate::inference::{HttpInference, InferenceService};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

pub fn validate_model_for_provider(provider: Provider, model_name: &str) -> Result<()> {
    let is_valid = match provider {
        Provider::Openai => {
            model_name.starts_with("gpt-")
                || model_name.starts_with("o1")
                || model_name.starts_with("o3")
        }
        Provider::Groq => !model_name.trim().is_empty(),
        Provider::Ollama => !model_name.trim().is_empty(),
        Provider::Auto => true,
    };

    if is_valid {
        return Ok(());
    }

    Err(anyhow::anyhow!(
        "model '{}' is not compatible with provider '{:?}'",
        model_name,
        provider
    ))
}

/// Resolves the configured provider into a live inference handle. Missing
/// credentials surface here, before the pipeline starts.
pub fn resolve_inference(
    cfg: &RuntimeConfig,
) -> Result<(Arc<dyn InferenceService>, Provider, String)> {
    let provider = match cfg.provider {
        Provider::Auto => detect_provider().context(
            "no provider could be auto-detected. Set OPENAI_API_KEY or GROQ_API_KEY, \
             or use --provider ollama",
        )?,
        p => p,
    };
    let timeout = Duration::from_secs(cfg.request_timeout_secs);

    match provider {
        Provider::Openai => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY is required for OpenAI provider")?;
            let model_name = cfg
                .model
                .clone()
                .unwrap_or_else(|| "gpt-4o-mini".to_string());
            validate_model_for_provider(provider, &model_name)?;
            let service =
                HttpInference::new(OPENAI_BASE_URL, Some(api_key), model_name.clone(), timeout)?;
            Ok((Arc::new(service), provider, model_name))
        }
        Provider::Groq => {
            let api_key = std::env::var("GROQ_API_KEY")
                .context("GROQ_API_KEY is required for Groq provider")?;
            let model_name = cfg
                .model
                .clone()
                .unwrap_or_else(|| "llama-3.3-70b-versatile".to_string());
            validate_model_for_provider(provider, &model_name)?;
            let service =
                HttpInference::new(GROQ_BASE_URL, Some(api_key), model_name.clone(), timeout)?;
            Ok((Arc::new(service), provider, model_name))
        }
        Provider::Ollama => {
            let host =
                std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
            let model_name = cfg.model.clone().unwrap_or_else(|| "llama3.1".to_string());
            validate_model_for_provider(provider, &model_name)?;
            let base_url = format!("{}/v1", host.trim_end_matches('/'));
            let service = HttpInference::new(base_url, None, model_name.clone(), timeout)?;
            Ok((Arc::new(service), provider, model_name))
        }
        Provider::Auto => unreachable!("auto provider must be resolved before matching"),
    }
}

pub fn detect_provider() -> Option<Provider> {
    if env_present("OPENAI_API_KEY") {
        return Some(Provider::Openai);
    }
    if env_present("GROQ_API_KEY") {
        return Some(Provider::Groq);
    }
    if env_present("OLLAMA_HOST") {
        return Some(Provider::Ollama);
    }
    None
}

pub fn env_present(key: &str) -> bool {
    std::env::var(key)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}

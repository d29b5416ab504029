use std::path::Path;

use anyhow::Result;

use crate::config::RuntimeConfig;
use crate::provider::{detect_provider, env_present};

pub fn run_doctor(cfg: &RuntimeConfig) -> Result<()> {
    println!(
        "Active profile: '{}' (config: {})",
        cfg.profile, cfg.config_path
    );

    let checks = [
        ("OPENAI_API_KEY", env_present("OPENAI_API_KEY")),
        ("GROQ_API_KEY", env_present("GROQ_API_KEY")),
        ("OLLAMA_HOST", env_present("OLLAMA_HOST")),
    ];

    println!("Provider environment check:");
    for (key, ok) in checks {
        let status = if ok { "set" } else { "missing" };
        println!("- {key}: {status}");
    }

    match detect_provider() {
        Some(provider) => println!("Auto provider resolution: {:?}", provider),
        None => {
            println!("Auto provider resolution: none");
            println!("Tip: export one provider key or run with --provider ollama");
        }
    }

    let corpus = Path::new(&cfg.corpus_path);
    if corpus.exists() {
        let lines = std::fs::read_to_string(corpus)
            .map(|content| content.lines().filter(|line| !line.trim().is_empty()).count())
            .unwrap_or(0);
        println!("Corpus: '{}' ({} review lines)", cfg.corpus_path, lines);
    } else {
        println!(
            "Corpus: '{}' missing (fetches will return empty review lists)",
            cfg.corpus_path
        );
    }

    println!(
        "Model override: {}",
        cfg.model.as_deref().unwrap_or("<provider-default>")
    );
    println!(
        "Pipeline: max_turns={} request_timeout_secs={}",
        cfg.max_turns, cfg.request_timeout_secs
    );
    println!(
        "Telemetry: enabled={} path={}",
        cfg.telemetry_enabled, cfg.telemetry_path
    );

    Ok(())
}

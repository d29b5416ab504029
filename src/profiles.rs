use anyhow::Result;

use crate::config::{ProfilesFile, RuntimeConfig};

pub fn run_profiles_list(profiles: &ProfilesFile, cfg: &RuntimeConfig) -> Result<()> {
    let mut names = profiles.profiles.keys().cloned().collect::<Vec<String>>();
    if !names.iter().any(|name| name == "default") {
        names.push("default".to_string());
    }
    names.sort();

    println!("Configured profiles (active='{}'):", cfg.profile);
    for name in names {
        let marker = if name == cfg.profile { "*" } else { " " };
        let source = if profiles.profiles.contains_key(&name) {
            "configured"
        } else {
            "implicit"
        };
        println!("{marker} {name} ({source})");
    }

    Ok(())
}

pub fn run_profiles_show(cfg: &RuntimeConfig) -> Result<()> {
    println!("Active profile: {}", cfg.profile);
    println!("Config path: {}", cfg.config_path);
    println!("Provider: {:?}", cfg.provider);
    println!(
        "Model: {}",
        cfg.model.as_deref().unwrap_or("<provider-default>")
    );
    println!("Corpus path: {}", cfg.corpus_path);
    println!("Stage max turns: {}", cfg.max_turns);
    println!("Request timeout (secs): {}", cfg.request_timeout_secs);
    println!("Telemetry enabled: {}", cfg.telemetry_enabled);
    println!("Telemetry path: {}", cfg.telemetry_path);
    Ok(())
}

//! Codex CLI builder.

use std::collections::BTreeMap;

use super::{env_map, AgentSettings};

pub(super) fn core_args(settings: &AgentSettings, instructions: &str) -> Vec<String> {
    vec![
        "codex".to_string(),
        "exec".to_string(),
        "-c".to_string(),
        "model_reasoning_effort=high".to_string(),
        "--full-auto".to_string(),
        "--skip-git-repo-check".to_string(),
        "-m".to_string(),
        settings.model.clone(),
        instructions.to_string(),
    ]
}

pub(super) fn environment(settings: &AgentSettings) -> BTreeMap<String, String> {
    env_map([
        ("OPENAI_API_KEY", settings.credentials.get("OPENAI_API_KEY")),
        ("CODEX_RUST", "1".to_string()),
    ])
}

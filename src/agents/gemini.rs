//! Gemini CLI builder.

use std::collections::BTreeMap;

use super::{env_map, AgentSettings};

pub(super) fn core_args(settings: &AgentSettings, instructions: &str) -> Vec<String> {
    vec![
        "gemini".to_string(),
        "--model".to_string(),
        settings.model.clone(),
        "-y".to_string(),
        "-p".to_string(),
        instructions.to_string(),
    ]
}

pub(super) fn environment(settings: &AgentSettings) -> BTreeMap<String, String> {
    let creds = &settings.credentials;
    env_map([
        ("GEMINI_API_KEY", creds.get("GEMINI_API_KEY")),
        ("GOOGLE_API_KEY", creds.get("GOOGLE_API_KEY")),
    ])
}

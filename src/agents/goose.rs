//! Goose builder.

use std::collections::BTreeMap;

use super::{env_map, AgentSettings};

pub(super) fn core_args(instructions: &str) -> Vec<String> {
    vec![
        "goose".to_string(),
        "run".to_string(),
        "--with-builtin".to_string(),
        "developer".to_string(),
        "--text".to_string(),
        instructions.to_string(),
    ]
}

pub(super) fn environment(settings: &AgentSettings) -> BTreeMap<String, String> {
    let creds = &settings.credentials;
    let provider = match settings.provider() {
        "" => "anthropic",
        p => p,
    };
    env_map([
        ("OPENAI_API_KEY", creds.get("OPENAI_API_KEY")),
        ("ANTHROPIC_API_KEY", creds.get("ANTHROPIC_API_KEY")),
        ("GOOGLE_API_KEY", creds.get("GOOGLE_API_KEY")),
        ("GOOSE_MODEL", settings.model.clone()),
        ("GOOSE_PROVIDER", provider.to_string()),
        // keyring prompts block headless runs
        ("GOOSE_DISABLE_KEYRING", "1".to_string()),
    ])
}

//! OpenCode builder.

use std::collections::BTreeMap;

use super::{env_map, AgentSettings};

pub(super) fn core_args(settings: &AgentSettings, instructions: &str) -> Vec<String> {
    vec![
        "opencode".to_string(),
        "run".to_string(),
        "-m".to_string(),
        settings.model.clone(),
        instructions.to_string(),
    ]
}

pub(super) fn environment(settings: &AgentSettings) -> BTreeMap<String, String> {
    let creds = &settings.credentials;
    let mut env = env_map([
        ("OPENAI_API_KEY", creds.get("OPENAI_API_KEY")),
        ("ANTHROPIC_API_KEY", creds.get("ANTHROPIC_API_KEY")),
        ("GOOGLE_API_KEY", creds.get("GOOGLE_API_KEY")),
        ("GEMINI_API_KEY", creds.get("GOOGLE_API_KEY")),
    ]);
    if settings.provider() == "xai" {
        env.insert("XAI_API_KEY".to_string(), creds.get("XAI_API_KEY"));
    }
    env
}

#[cfg(test)]
mod tests {
    use crate::agents::{AgentKind, AgentSpec, CommandBuilder, Credentials, FileList};

    #[test]
    fn test_xai_key_only_for_xai_provider() {
        let creds = Credentials::from_pairs([("XAI_API_KEY", "xai")]);

        let plain = AgentSpec::new(AgentKind::OpenCode, "grok-4", "img");
        let cmd = CommandBuilder::for_agent(&plain, &creds)
            .unwrap()
            .build_core_command("go", &FileList::default());
        assert!(!cmd.env.contains_key("XAI_API_KEY"));

        let xai = plain.with_provider("xai");
        let cmd = CommandBuilder::for_agent(&xai, &creds)
            .unwrap()
            .build_core_command("go", &FileList::default());
        assert_eq!(cmd.env["XAI_API_KEY"], "xai");
    }
}

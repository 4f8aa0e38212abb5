//! Qwen Code builder.
//!
//! Qwen Code talks to any OpenAI-compatible endpoint; DashScope is the
//! default backend and OpenRouter the alternative.

use std::collections::BTreeMap;

use super::{env_map, AgentSettings};

const DASHSCOPE_COMPATIBLE_URL: &str = "https://dashscope-intl.aliyuncs.com/compatible-mode/v1";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

pub(super) fn core_args(settings: &AgentSettings, instructions: &str) -> Vec<String> {
    vec![
        "qwen".to_string(),
        "-y".to_string(),
        "-m".to_string(),
        settings.model.clone(),
        "-p".to_string(),
        instructions.to_string(),
    ]
}

pub(super) fn environment(settings: &AgentSettings) -> BTreeMap<String, String> {
    let creds = &settings.credentials;
    let (url, key) = if settings.provider() == "openrouter" {
        (OPENROUTER_URL, creds.get("OPENROUTER_API_KEY"))
    } else {
        (DASHSCOPE_COMPATIBLE_URL, creds.get("DASHSCOPE_API_KEY"))
    };
    env_map([
        ("OPENAI_BASE_URL", url.to_string()),
        ("OPENAI_API_KEY", key),
        ("OPENAI_MODEL", settings.model.clone()),
    ])
}

#[cfg(test)]
mod tests {
    use crate::agents::{AgentKind, AgentSpec, CommandBuilder, Credentials, FileList};

    #[test]
    fn test_openrouter_switches_endpoint_and_key() {
        let creds = Credentials::from_pairs([
            ("OPENROUTER_API_KEY", "or-key"),
            ("DASHSCOPE_API_KEY", "dash-key"),
        ]);
        let spec = AgentSpec::new(AgentKind::Qwen, "qwen3-coder", "img").with_provider("openrouter");
        let cmd = CommandBuilder::for_agent(&spec, &creds)
            .unwrap()
            .build_core_command("go", &FileList::default());
        assert_eq!(cmd.env["OPENAI_BASE_URL"], "https://openrouter.ai/api/v1");
        assert_eq!(cmd.env["OPENAI_API_KEY"], "or-key");
        assert_eq!(cmd.env["OPENAI_MODEL"], "qwen3-coder");
    }
}

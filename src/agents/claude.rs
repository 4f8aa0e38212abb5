//! Claude Code builder.
//!
//! Claude Code speaks the Anthropic API; several providers expose an
//! Anthropic-compatible proxy, selected by overriding the base URL and
//! auth token.

use std::collections::BTreeMap;

use super::AgentSettings;

const DASHSCOPE_PROXY_URL: &str =
    "https://dashscope-intl.aliyuncs.com/api/v2/apps/claude-code-proxy";
const DEEPSEEK_ANTHROPIC_URL: &str = "https://api.deepseek.com/anthropic";
const MOONSHOT_ANTHROPIC_URL: &str = "https://api.moonshot.ai/anthropic";
const ZAI_ANTHROPIC_URL: &str = "https://api.z.ai/api/anthropic";

pub(super) fn core_args(settings: &AgentSettings, instructions: &str) -> Vec<String> {
    vec![
        "claude".to_string(),
        "--debug".to_string(),
        "--verbose".to_string(),
        "--dangerously-skip-permissions".to_string(),
        "--model".to_string(),
        settings.model.clone(),
        "-p".to_string(),
        instructions.to_string(),
    ]
}

pub(super) fn environment(settings: &AgentSettings) -> BTreeMap<String, String> {
    let creds = &settings.credentials;
    let anthropic_key = creds.first_of(&["ANTHROPIC_API_KEY", "DASHSCOPE_API_KEY"]);

    let mut env = BTreeMap::new();
    env.insert("ANTHROPIC_API_KEY".to_string(), anthropic_key.clone());

    let proxy = match settings.provider() {
        "dashscope" => {
            let token = creds.first_of(&["DASHSCOPE_API_KEY"]);
            let token = if token.is_empty() { anthropic_key } else { token };
            let url = creds.get("ANTHROPIC_BASE_URL");
            let url = if url.is_empty() {
                DASHSCOPE_PROXY_URL.to_string()
            } else {
                url
            };
            Some((token, url))
        }
        "deepseek" => Some((creds.get("DEEPSEEK_API_KEY"), DEEPSEEK_ANTHROPIC_URL.to_string())),
        "moonshot" => Some((creds.get("MOONSHOT_API_KEY"), MOONSHOT_ANTHROPIC_URL.to_string())),
        "zai" => Some((creds.get("ZAI_API_KEY"), ZAI_ANTHROPIC_URL.to_string())),
        _ => None,
    };

    if let Some((token, url)) = proxy {
        env.insert("ANTHROPIC_AUTH_TOKEN".to_string(), token);
        env.insert("ANTHROPIC_BASE_URL".to_string(), url);
    }

    env
}

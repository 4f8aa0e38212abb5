//! Cursor agent builder.

use std::collections::BTreeMap;

use super::{env_map, AgentSettings, FileList};

pub(super) fn core_args(settings: &AgentSettings, instructions: &str, files: &FileList) -> Vec<String> {
    let mut args = vec![
        "cursor-agent".to_string(),
        "--model".to_string(),
        settings.model.clone(),
        "-p".to_string(),
        instructions.to_string(),
    ];
    args.extend(files.source_files.iter().cloned());
    args
}

pub(super) fn environment(settings: &AgentSettings) -> BTreeMap<String, String> {
    env_map([("CURSOR_API_KEY", settings.credentials.get("CURSOR_API_KEY"))])
}

//! Aider builder.
//!
//! Aider is told about editable files with `--file` and about read-only
//! context with `--read`. Git integration is switched off so that the
//! benchmark owns the workspace's version-control state.

use std::collections::BTreeMap;

use super::{env_map, AgentSettings, FileList};

const FALLBACK_SOURCE_GLOB: &str = "*.ts";
const FALLBACK_TEST_GLOB: &str = "*.test.ts";

pub(super) fn core_args(settings: &AgentSettings, instructions: &str, files: &FileList) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "aider".to_string(),
        "--yes-always".to_string(),
        "--no-auto-commits".to_string(),
        "--model".to_string(),
        settings.model.clone(),
    ];

    if files.source_files.is_empty() {
        args.extend(["--file".to_string(), FALLBACK_SOURCE_GLOB.to_string()]);
    } else {
        for file in &files.source_files {
            args.extend(["--file".to_string(), file.clone()]);
        }
    }

    if files.test_files.is_empty() {
        args.extend(["--read".to_string(), FALLBACK_TEST_GLOB.to_string()]);
    } else {
        for file in &files.test_files {
            args.extend(["--read".to_string(), file.clone()]);
        }
    }

    args.extend(["--message".to_string(), instructions.to_string()]);
    args
}

pub(super) fn environment(settings: &AgentSettings) -> BTreeMap<String, String> {
    let creds = &settings.credentials;
    env_map([
        ("OPENAI_API_KEY", creds.get("OPENAI_API_KEY")),
        ("ANTHROPIC_API_KEY", creds.get("ANTHROPIC_API_KEY")),
        ("GOOGLE_API_KEY", creds.get("GOOGLE_API_KEY")),
        ("GEMINI_API_KEY", creds.get("GOOGLE_API_KEY")),
        ("AIDER_GIT", "false".to_string()),
        ("AIDER_AUTO_COMMITS", "false".to_string()),
        ("AIDER_SHOW_RELEASE_NOTES", "false".to_string()),
        ("AIDER_SKIP_SANITY_CHECK_REPO", "true".to_string()),
        ("AIDER_CHAT_HISTORY_FILE", "/dev/null".to_string()),
        ("AIDER_INPUT_HISTORY_FILE", "/dev/null".to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use crate::agents::{AgentKind, AgentSpec, CommandBuilder, Credentials, FileList};

    fn builder() -> CommandBuilder {
        let spec = AgentSpec::new(AgentKind::Aider, "gpt-4o", "img");
        CommandBuilder::for_agent(&spec, &Credentials::default()).unwrap()
    }

    #[test]
    fn test_files_become_file_and_read_flags() {
        let files = FileList::new(
            vec!["two-fer.ts".into()],
            vec!["two-fer.test.ts".into()],
        );
        let cmd = builder().build_core_command("Solve", &files);
        let joined = cmd.argv.join(" ");
        assert!(joined.contains("--file two-fer.ts"));
        assert!(joined.contains("--read two-fer.test.ts"));
        assert_eq!(&cmd.argv[cmd.argv.len() - 2..], ["--message", "Solve"]);
    }

    #[test]
    fn test_empty_file_list_uses_globs() {
        let cmd = builder().build_core_command("Solve", &FileList::default());
        let joined = cmd.argv.join(" ");
        assert!(joined.contains("--file *.ts"));
        assert!(joined.contains("--read *.test.ts"));
    }

    #[test]
    fn test_history_and_commits_disabled() {
        let cmd = builder().build_core_command("Solve", &FileList::default());
        assert_eq!(cmd.env["AIDER_AUTO_COMMITS"], "false");
        assert_eq!(cmd.env["AIDER_CHAT_HISTORY_FILE"], "/dev/null");
        assert_eq!(cmd.env["AIDER_INPUT_HISTORY_FILE"], "/dev/null");
    }
}

//! Custom agent builder.
//!
//! Runs an operator-supplied shell command and pipes the instructions to it
//! on stdin, so any CLI that reads a prompt from stdin can be benchmarked.
//! This is the only variant that produces an interpolated shell string;
//! the instructions are quoted with [`crate::execution::shell::quote`]
//! before interpolation.

use std::collections::BTreeMap;

use super::{env_map, AgentSettings, FileList};
use crate::execution::shell;

pub(super) fn core_args(settings: &AgentSettings, instructions: &str) -> Vec<String> {
    let command = settings.custom_command.as_deref().unwrap_or("cat");
    let script = format!("printf '%s' {} | {}", shell::quote(instructions), command);
    vec!["sh".to_string(), "-c".to_string(), script]
}

pub(super) fn environment(settings: &AgentSettings, files: &FileList) -> BTreeMap<String, String> {
    env_map([
        ("AGENT_BENCH_MODEL", settings.model.clone()),
        ("AGENT_BENCH_PROVIDER", settings.provider().to_string()),
        ("AGENT_BENCH_SOURCE_FILES", files.source_files.join(" ")),
        ("AGENT_BENCH_TEST_FILES", files.test_files.join(" ")),
    ])
}

#[cfg(test)]
mod tests {
    use crate::agents::{AgentKind, AgentSpec, CommandBuilder, Credentials, FileList};

    #[test]
    fn test_instructions_are_quoted_into_script() {
        let spec = AgentSpec::new(AgentKind::Custom, "", "img").with_custom_command("my-agent --stdin");
        let cmd = CommandBuilder::for_agent(&spec, &Credentials::default())
            .unwrap()
            .build_core_command("It's $HOME `id`", &FileList::default());

        assert_eq!(&cmd.argv[..2], ["sh", "-c"]);
        assert_eq!(
            cmd.argv[2],
            r#"printf '%s' 'It'\''s $HOME `id`' | my-agent --stdin"#
        );
        assert_eq!(cmd.env["AGENT_BENCH_PROVIDER"], "");
    }

    #[tokio::test]
    async fn test_agent_receives_literal_instructions_on_stdin() {
        let spec = AgentSpec::new(AgentKind::Custom, "", "img").with_custom_command("cat");
        let text = "Say \"hi\"; it's $USER's `turn`\nsecond line";
        let cmd = CommandBuilder::for_agent(&spec, &Credentials::default())
            .unwrap()
            .build_core_command(text, &FileList::default());

        let output = tokio::process::Command::new(&cmd.argv[0])
            .args(&cmd.argv[1..])
            .output()
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), text);
    }
}

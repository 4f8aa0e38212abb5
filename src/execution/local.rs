//! Host execution strategy.

use super::{ExecutionContext, PreparedCommand, SpawnOptions};
use crate::agents::CoreCommand;

/// Runs the command unchanged on the host, inside the exercise directory.
///
/// The command's environment is merged over the ambient process
/// environment at spawn time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalStrategy;

impl LocalStrategy {
    /// Prepares `core` for host execution.
    pub fn prepare(&self, core: &CoreCommand, ctx: &ExecutionContext) -> PreparedCommand {
        PreparedCommand {
            argv: core.argv.clone(),
            options: SpawnOptions {
                cwd: Some(ctx.absolute_path()),
                env: Some(core.env.clone()),
            },
            cleanup: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_local_keeps_argv_and_sets_cwd_env() {
        let core = CoreCommand::new(vec!["codex".into(), "exec".into()])
            .with_env("OPENAI_API_KEY", "")
            .with_env("CODEX_RUST", "1");
        let ctx = ExecutionContext::new("/work/two-fer");

        let prepared = LocalStrategy.prepare(&core, &ctx);

        assert_eq!(prepared.argv, vec!["codex", "exec"]);
        assert_eq!(prepared.options.cwd, Some(PathBuf::from("/work/two-fer")));
        let env = prepared.options.env.unwrap();
        assert_eq!(env["CODEX_RUST"], "1");
        assert_eq!(env["OPENAI_API_KEY"], "");
    }
}

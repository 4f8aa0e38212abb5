//! Git-backed exercise workspace.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::VcsError;
use crate::execution::absolute;

/// Pathspecs excluded from the post-agent diff.
pub const LOCKFILE_EXCLUDES: &[&str] = &[
    "yarn.lock",
    "package-lock.json",
    "bun.lockb",
    "pnpm-lock.yaml",
    "npm-shrinkwrap.json",
    "Pipfile.lock",
    "poetry.lock",
    "pdm.lock",
    "Cargo.lock",
    "go.sum",
    "Gemfile.lock",
    "composer.lock",
    "packages.lock.json",
    "project.assets.json",
    "gradle.lockfile",
    "*.lockfile",
    "*.lock",
    "*-lock.*",
    "lockfile*",
];

/// An exercise directory under git version control.
#[derive(Debug, Clone)]
pub struct GitWorkspace {
    root: PathBuf,
}

impl GitWorkspace {
    /// Creates a workspace rooted at `root`, made absolute.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: absolute(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Restores every tracked file in the workspace to `HEAD`.
    ///
    /// Untracked files are left in place.
    pub async fn reset(&self) -> Result<(), VcsError> {
        self.git(&["checkout", "HEAD", "--", "."], &[0]).await?;
        Ok(())
    }

    /// Returns `git status --porcelain` output for the workspace directory.
    ///
    /// Paths in the output are relative to the repository root.
    pub async fn status_porcelain(&self) -> Result<String, VcsError> {
        self.git(&["status", "--porcelain", "--", "."], &[0]).await
    }

    /// Returns the paths of all modified, added or untracked files under the
    /// workspace, relative to the workspace root.
    pub async fn changed_files(&self) -> Result<Vec<String>, VcsError> {
        let status = self.status_porcelain().await?;
        let prefix = self.repo_prefix().await?;
        Ok(parse_porcelain(&status)
            .into_iter()
            .filter_map(|path| path.strip_prefix(prefix.as_str()).map(str::to_string))
            .filter(|path| !path.is_empty())
            .collect())
    }

    /// Returns the unstaged diff for `files`, given relative to the
    /// workspace root. Paths in the diff are workspace-relative too.
    ///
    /// `git diff` exits with 1 on some setups when differences exist; both 0
    /// and 1 count as success.
    pub async fn diff(&self, files: &[String]) -> Result<String, VcsError> {
        let mut args = vec!["diff", "--relative", "--color=never", "--"];
        args.extend(files.iter().map(String::as_str));
        self.git(&args, &[0, 1]).await
    }

    /// Restores `file` from `HEAD` into both the index and the worktree.
    pub async fn restore(&self, file: &str) -> Result<(), VcsError> {
        self.git(
            &["restore", "--source=HEAD", "--staged", "--worktree", "--", file],
            &[0],
        )
        .await?;
        Ok(())
    }

    /// Returns `git diff HEAD` for the whole workspace, without lockfiles.
    pub async fn diff_head_excluding_lockfiles(&self) -> Result<String, VcsError> {
        let excludes: Vec<String> = LOCKFILE_EXCLUDES
            .iter()
            .map(|p| format!(":(exclude){}", p))
            .collect();
        let mut args = vec!["diff", "HEAD", "--color=never", "--", "."];
        args.extend(excludes.iter().map(String::as_str));
        self.git(&args, &[0]).await
    }

    /// Path of the workspace inside its repository, with a trailing slash
    /// (empty at the repository root).
    async fn repo_prefix(&self) -> Result<String, VcsError> {
        let out = self.git(&["rev-parse", "--show-prefix"], &[0]).await?;
        Ok(out.trim_end_matches(['\n', '\r']).to_string())
    }

    async fn git(&self, args: &[&str], ok_codes: &[i32]) -> Result<String, VcsError> {
        debug!(root = %self.root.display(), args = ?args, "Running git");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        match output.status.code() {
            Some(code) if ok_codes.contains(&code) => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            _ => Err(VcsError::CommandFailed {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

/// Extracts file paths from `git status --porcelain` output.
///
/// Renames (`R  old -> new`) yield the new path.
pub fn parse_porcelain(status: &str) -> Vec<String> {
    status
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = line[3..].trim();
            match path.split_once(" -> ") {
                Some((_, to)) => to.to_string(),
                None => path.to_string(),
            }
        })
        .filter(|p| !p.is_empty())
        .collect()
}

//! Version-control operations on exercise workspaces.
//!
//! The pipeline treats git as a black-box collaborator: reset the working
//! tree, read machine-parsable status, diff a file set, and restore single
//! files. Every failure here is a [`crate::error::VcsError`] that callers
//! downgrade to a warning.

pub mod git;

pub use git::{parse_porcelain, GitWorkspace, LOCKFILE_EXCLUDES};

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    /// Runs `git` in `dir` and panics on failure.
    pub(crate) fn git(dir: &Path, args: &[&str]) {
        let output = std::process::Command::new("git")
            .args(["-c", "user.name=bench", "-c", "user.email=bench@localhost"])
            .args(args)
            .current_dir(dir)
            .output()
            .expect("git must be installed");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Creates a git repository containing `files` in a single commit.
    pub(crate) fn init_repo(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        git(dir.path(), &["init", "-q"]);
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create dirs");
            }
            std::fs::write(path, content).expect("write file");
        }
        git(dir.path(), &["add", "-A"]);
        git(dir.path(), &["commit", "-q", "-m", "initial"]);
        dir
    }
}

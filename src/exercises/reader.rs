//! Reads exercises, their file lists and instructions from disk.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::RegexSet;
use tracing::{debug, warn};

use crate::agents::FileList;
use crate::error::ExerciseError;

/// Header prepended to every exercise's instructions.
pub const BASE_INSTRUCTION: &str = "\
You are solving a programming exercise in the current directory.
Implement the solution in the existing source files so that the exercise's tests pass.
Do not modify, rename or delete the test files; they are restored before grading.
Do not ask questions: work autonomously until the implementation is complete.";

const PRACTICE_DIR: [&str; 2] = ["exercises", "practice"];
const INSTRUCTIONS_FILE: [&str; 2] = [".docs", "instructions.md"];
const ENVIRONMENT_FILE: &str = "CLAUDE.md";

fn test_patterns() -> &'static RegexSet {
    static PATTERNS: OnceLock<RegexSet> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        RegexSet::new([
            r"\.test\.",
            r"_test\.",
            r"\.spec\.",
            r"_spec\.",
            r"^test_.*\.py$",
            r"Test\.",
            r"^Test.*\.",
        ])
        .expect("Invalid regex for test file patterns")
    })
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns true if `path` names a test file.
pub fn is_test_file(path: &str) -> bool {
    test_patterns().is_match(file_name(path))
}

/// Returns true if `path` names a JavaScript/TypeScript implementation file.
pub fn is_source_file(path: &str) -> bool {
    let name = file_name(path);
    [".ts", ".js", ".jsx", ".tsx"]
        .iter()
        .any(|ext| name.ends_with(ext))
        && !is_test_file(name)
}

/// A fully loaded exercise, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct Exercise {
    pub name: String,
    pub path: PathBuf,
    pub files: FileList,
    pub instructions: String,
}

impl Exercise {
    /// Creates an exercise from its parts.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        files: FileList,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            files,
            instructions: instructions.into(),
        }
    }
}

/// Reads exercises under `<root>/exercises/practice`.
#[derive(Debug, Clone)]
pub struct ExerciseReader {
    root: PathBuf,
}

impl ExerciseReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the practice exercises.
    pub fn practice_dir(&self) -> PathBuf {
        PRACTICE_DIR.iter().fold(self.root.clone(), |p, c| p.join(c))
    }

    /// Directory of a single exercise.
    pub fn exercise_path(&self, name: &str) -> PathBuf {
        self.practice_dir().join(name)
    }

    /// Lists exercise names, sorted, skipping hidden directories.
    pub async fn list(&self) -> Result<Vec<String>, ExerciseError> {
        let dir = self.practice_dir();
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|source| ExerciseError::ReadDir {
                path: dir.clone(),
                source,
            })?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| ExerciseError::ReadDir {
                path: dir.clone(),
                source,
            })?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => names.push(name),
                Ok(_) => {}
                Err(e) => debug!(entry = %name, error = %e, "Skipping unreadable entry"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Classifies the top-level files of an exercise into sources and tests.
    pub async fn file_list(&self, name: &str) -> Result<FileList, ExerciseError> {
        let dir = self.exercise_path(name);
        if !dir.is_dir() {
            return Err(ExerciseError::NotFound(name.to_string()));
        }

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|source| ExerciseError::ReadDir {
                path: dir.clone(),
                source,
            })?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| ExerciseError::ReadDir {
                path: dir.clone(),
                source,
            })?
        {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
        files.sort();

        let test_files = files.iter().filter(|f| is_test_file(f)).cloned().collect();
        let source_files = files.into_iter().filter(|f| is_source_file(f)).collect();
        Ok(FileList::new(source_files, test_files))
    }

    /// Assembles the instructions sent to the agent.
    ///
    /// Layout: base header, the exercise's `.docs/instructions.md`, the
    /// repository's `CLAUDE.md` when present, then `custom` when given,
    /// separated by blank lines.
    pub async fn instructions(
        &self,
        name: &str,
        custom: Option<&str>,
    ) -> Result<String, ExerciseError> {
        let path = INSTRUCTIONS_FILE
            .iter()
            .fold(self.exercise_path(name), |p, c| p.join(c));
        let exercise_text = tokio::fs::read_to_string(&path).await.map_err(|source| {
            ExerciseError::Instructions {
                exercise: name.to_string(),
                source,
            }
        })?;

        let mut parts = vec![BASE_INSTRUCTION.to_string(), exercise_text];

        let env_path = self.root.join(ENVIRONMENT_FILE);
        match tokio::fs::read_to_string(&env_path).await {
            Ok(text) => parts.push(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %env_path.display(), error = %e, "Could not read environment notes"),
        }

        if let Some(custom) = custom.filter(|c| !c.trim().is_empty()) {
            parts.push(custom.to_string());
        }

        Ok(parts.join("\n\n"))
    }

    /// Loads everything the pipeline needs for `name`.
    pub async fn load(&self, name: &str, custom: Option<&str>) -> Result<Exercise, ExerciseError> {
        let files = self.file_list(name).await?;
        let instructions = self.instructions(name, custom).await?;
        Ok(Exercise::new(name, self.exercise_path(name), files, instructions))
    }
}

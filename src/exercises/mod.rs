//! Exercise discovery and instruction loading.
//!
//! Exercises live in `<root>/exercises/practice/<name>`, each a directory
//! under git with its source stubs, test files and `.docs/instructions.md`.

pub mod reader;

pub use reader::{is_source_file, is_test_file, Exercise, ExerciseReader, BASE_INSTRUCTION};

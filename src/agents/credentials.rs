//! Credential and provider-override configuration for command builders.

use std::collections::BTreeMap;

/// Environment variables the builders know how to consume.
pub const CREDENTIAL_VARS: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "CURSOR_API_KEY",
    "DASHSCOPE_API_KEY",
    "DEEPSEEK_API_KEY",
    "GEMINI_API_KEY",
    "GOOGLE_API_KEY",
    "MOONSHOT_API_KEY",
    "OPENAI_API_KEY",
    "OPENROUTER_API_KEY",
    "XAI_API_KEY",
    "ZAI_API_KEY",
];

/// Credential values captured once at startup.
///
/// Builders look values up here instead of reading the process environment,
/// so a builder's output depends only on its inputs. Missing values read as
/// the empty string; the agent process is expected to fail on its own.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    values: BTreeMap<String, String>,
}

impl Credentials {
    /// Captures every variable in [`CREDENTIAL_VARS`] that is set and non-empty.
    pub fn from_env() -> Self {
        let values = CREDENTIAL_VARS
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.to_string(), v))
            })
            .collect();
        Self { values }
    }

    /// Builds credentials from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value for `name`, or an empty string.
    pub fn get(&self, name: &str) -> String {
        self.values.get(name).cloned().unwrap_or_default()
    }

    /// Returns the first non-empty value among `names`, or an empty string.
    pub fn first_of(&self, names: &[&str]) -> String {
        names
            .iter()
            .filter_map(|n| self.values.get(*n))
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// Returns true if no credential is known.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.values.keys().map(|k| (k, "***")))
            .finish()
    }
}

//! Secret redaction for log output.
//!
//! Agent commands carry credentials through their environment (and, for
//! containers, through `-e KEY=VALUE` arguments). Everything logged from a
//! command line or from captured agent output goes through this module.

use std::sync::OnceLock;

use regex::Regex;

use crate::execution::shell;

/// Logged command lines are cut after this many characters.
pub const MAX_LOGGED_COMMAND_LEN: usize = 1024;

struct Patterns {
    assignment: Regex,
    bearer: Regex,
    sk_token: Regex,
    secret_pair: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        assignment: Regex::new(r"^[A-Z0-9_]+_(API_KEY|TOKEN|SECRET)=")
            .expect("Invalid regex for secret assignments"),
        bearer: Regex::new(r"Bearer\s+[A-Za-z0-9._\-]+").expect("Invalid regex for bearer tokens"),
        sk_token: Regex::new(r"sk-[A-Za-z0-9_\-]{10,}").expect("Invalid regex for sk- tokens"),
        secret_pair: Regex::new(r"([A-Z0-9_]+_(API_KEY|TOKEN|SECRET))=(\S+)")
            .expect("Invalid regex for secret pairs"),
    })
}

/// Masks bearer tokens, `sk-` keys and `*_API_KEY=`/`*_TOKEN=`/`*_SECRET=`
/// values in free text.
pub fn redact(text: &str) -> String {
    let p = patterns();
    let out = p.bearer.replace_all(text, "Bearer ***");
    let out = p.sk_token.replace_all(&out, "sk-***");
    p.secret_pair.replace_all(&out, "$1=***").into_owned()
}

/// Renders `argv` for logging with secrets masked, truncated to
/// [`MAX_LOGGED_COMMAND_LEN`] characters.
pub fn sanitize_command(argv: &[String]) -> String {
    let p = patterns();
    let masked: Vec<String> = argv
        .iter()
        .map(|arg| {
            if p.assignment.is_match(arg) {
                let key = arg.split('=').next().unwrap_or_default();
                format!("{}=***", key)
            } else {
                redact(arg)
            }
        })
        .collect();
    truncate(&shell::join(&masked), MAX_LOGGED_COMMAND_LEN)
}

/// Cuts `text` to at most `max` characters, appending `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Redacted, truncated preview of captured output.
pub fn preview(text: &str, max: usize) -> String {
    truncate(&redact(text), max)
}

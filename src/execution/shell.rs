//! POSIX shell quoting.
//!
//! Anything interpolated into a single `sh -c` string must go through
//! [`quote`]. Free-form instructions routinely contain quotes, backticks and
//! `$`, all of which the shell would otherwise interpret.

/// Quotes `s` so that a POSIX shell parses it back as exactly one word.
///
/// The text is wrapped in single quotes; embedded single quotes are closed,
/// escaped and reopened (`'` becomes `'\''`). Nothing else is special inside
/// single quotes, so no other escaping is needed.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Renders `argv` as a copy-pasteable shell command line.
///
/// Words made only of safe characters are left bare.
pub fn join(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if is_bare_word(arg) {
                arg.clone()
            } else {
                quote(arg)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_bare_word(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | ',' | '@' | '+')
        })
}

//! Command formatting: human-friendly key tokens to host escape syntax
//!
//! A pure string transform with no host interaction and no failure modes.
//! Bracket-tagged and bare key tokens are rewritten to the `<KEY>` escapes
//! the emulator understands, and every formatted command is guaranteed to
//! end in the submit token.

/// Escape sequence for the key that commits input to the remote host.
pub const SUBMIT_TOKEN: &str = "<ENTER>";

// Substitution table, applied by a single left-to-right scan. Order matters:
// the already-escaped form of each key precedes its bracket and bare forms,
// so escapes present in the input (or just emitted) are never escaped twice.
const KEY_TOKENS: &[(&str, &str)] = &[
    ("<ENTER>", "<ENTER>"),
    ("{ENTER}", "<ENTER>"),
    ("ENTER", "<ENTER>"),
    ("<TAB>", "<TAB>"),
    ("{TAB}", "<TAB>"),
    ("TAB", "<TAB>"),
    ("<CLEAR>", "<CLEAR>"),
    ("{CLEAR}", "<CLEAR>"),
    ("CLEAR", "<CLEAR>"),
    ("<PA1>", "<PA1>"),
    ("{PA1}", "<PA1>"),
    ("PA1", "<PA1>"),
    ("<PA2>", "<PA2>"),
    ("{PA2}", "<PA2>"),
    ("PA2", "<PA2>"),
    ("<PA3>", "<PA3>"),
    ("{PA3}", "<PA3>"),
    ("PA3", "<PA3>"),
    ("<RESET>", "<RESET>"),
    ("{RESET}", "<RESET>"),
    ("RESET", "<RESET>"),
];

/// Rewrite key tokens to host escape syntax and guarantee the trailing
/// submit token.
///
/// Idempotent: feeding a formatted command back through produces the same
/// string. When the substituted result already ends in [`SUBMIT_TOKEN`] it
/// is returned as is; otherwise the trimmed result gets a single space and
/// the submit token appended.
pub fn format_command(command: &str) -> String {
    let substituted = substitute_tokens(command);
    let trimmed = substituted.trim();
    if trimmed.ends_with(SUBMIT_TOKEN) {
        substituted
    } else {
        format!("{trimmed} {SUBMIT_TOKEN}")
    }
}

// One pass over the input; at each position the first matching table entry
// wins, its replacement is emitted and its source consumed. Replacement text
// is never rescanned.
fn substitute_tokens(command: &str) -> String {
    let mut out = String::with_capacity(command.len());
    let mut rest = command;
    'scan: while !rest.is_empty() {
        for (token, escape) in KEY_TOKENS {
            if rest.starts_with(token) {
                out.push_str(escape);
                rest = &rest[token.len()..];
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }
    out
}

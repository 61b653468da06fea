// src/script/quote.rs

/// Quote `value` so a POSIX shell reads it back as exactly one word with the
/// same bytes.
///
/// The value is wrapped in single quotes; each embedded `'` becomes `'\''`
/// (close quote, escaped quote, reopen quote).
pub fn quote_for_shell(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

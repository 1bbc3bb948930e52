//! Table-name matching. Two hands share a table iff their identifiers
//! are string-equal after stripping trailing whitespace, and after further
//! stripping a parenthesized numeric instance suffix — but only when BOTH
//! sides carry one, so two `unknown_table_<N>` synthetic ids (underscore
//! suffix, no parens) never collide on their shared prefix.

pub fn same_table(a: &str, b: &str) -> bool {
    let a = a.trim_end();
    let b = b.trim_end();
    if a == b {
        return true;
    }
    match (strip_instance_suffix(a), strip_instance_suffix(b)) {
        (Some(a_base), Some(b_base)) => a_base == b_base,
        _ => false,
    }
}

/// Strips a trailing `" (<digits>)"` instance marker, e.g. `"Main Table (3)"`
/// → `"Main Table"`. Returns `None` when the string carries no such suffix.
fn strip_instance_suffix(s: &str) -> Option<&str> {
    let rest = s.strip_suffix(')')?;
    let open = rest.rfind(" (")?;
    let digits = &rest[open + 2..];
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(&s[..open])
    } else {
        None
    }
}

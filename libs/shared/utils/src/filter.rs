//! PostgREST filter values built from user input.
//!
//! Values are kept intact and percent-encoded, so characters such as `&`, `#`
//! or `(` reach the store as typed instead of splitting the query string.

/// How an `ilike` filter compares against the user's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeMatch {
    /// Case-insensitive equality.
    Exact,
    /// Case-insensitive substring.
    Contains,
}

/// Escape LIKE wildcards so the value only matches itself.
///
/// PostgREST rewrites `*` to `%` before the pattern reaches Postgres, so a
/// literal star cannot be expressed and is matched as any single character.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => escaped.push('_'),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// An `ilike.` operator and pattern, percent-encoded for a query string.
pub fn ilike(value: &str, mode: LikeMatch) -> String {
    let pattern = match mode {
        LikeMatch::Exact => escape_like(value),
        LikeMatch::Contains => format!("*{}*", escape_like(value)),
    };
    format!("ilike.{}", urlencoding::encode(&pattern))
}

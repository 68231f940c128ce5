//! Extraction of mapping specifications embedded in ASP code.
//!
//! Specification fragments live in `%!` comments inside ASP source text. A
//! `%!` marker inside a quoted ASP string does not start a fragment, and a
//! regular `%` comment before the marker hides it. Extracted fragments are
//! joined with newlines and parsed as one specification.

use std::sync::LazyLock;

use regex::Regex;

/// Matches one line carrying an embedded specification fragment: ASP code
/// (with quoted strings skipped as a unit), the `%!` marker, the fragment,
/// and an optional trailing `%` comment.
static EMBEDDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^(?:[^\n%"]|"(?:[^\n\\"]|\\.)*")*%!(?P<spec>[^\n%]*)(?:%.*)?$"#)
        .unwrap_or_else(|e| unreachable!("embedded spec regex is valid: {e}"))
});

/// Extract the embedded specification fragments from ASP code, joined with
/// newlines. Returns an empty string when the code embeds no specification.
pub(crate) fn extract(code: &str) -> String {
    let fragments: Vec<&str> = EMBEDDED
        .captures_iter(code)
        .filter_map(|c| c.name("spec"))
        .map(|m| m.as_str())
        .collect();
    fragments.join("\n")
}

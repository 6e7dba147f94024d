use std::fmt::Write;

/// Renders `text` as a double-quoted literal. JSON string escapes are a
/// subset of what Go accepts, so the result is a valid Go string literal.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("{:?}", text))
}

/// Prefixes every line of `source` with a right-aligned line number.
pub fn numbered_listing(source: &str) -> String {
    let mut listing = String::new();
    for (i, line) in source.lines().enumerate() {
        let _ = writeln!(listing, "{:5}\t{}", i + 1, line);
    }
    listing
}

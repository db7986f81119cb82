//! Whitespace normalization of extracted text.

use std::sync::LazyLock;

use regex::Regex;

static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("blank line pattern is valid"));

static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ ]{2,}").expect("space run pattern is valid"));

/// Collapse blank-line runs to one empty line, squeeze spaces, and trim
/// every line as well as the whole text.
pub fn finalize(text: &str) -> String {
    let text = BLANK_LINE_RUNS.replace_all(text, "\n\n");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    lines.join("\n").trim().to_string()
}

//! Shared utility functions used across multiple modules.

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Strip markdown punctuation from note content and truncate it, producing
/// plain text suitable for list previews.
///
/// Removes heading/emphasis/code/link markers and leading list bullets;
/// keeps line breaks.
pub fn markdown_preview(text: &str, max_chars: usize) -> String {
    let mut cleaned = String::with_capacity(text.len().min(max_chars));
    for (index, line) in text.lines().enumerate() {
        if index > 0 {
            cleaned.push('\n');
        }
        let line = strip_list_marker(line);
        cleaned.extend(line.chars().filter(|c| !is_markdown_marker(*c)));
    }
    if cleaned.chars().count() > max_chars {
        cleaned.chars().take(max_chars).collect()
    } else {
        cleaned
    }
}

const fn is_markdown_marker(c: char) -> bool {
    matches!(c, '#' | '*' | '`' | '_' | '[' | ']' | '!')
}

fn strip_list_marker(line: &str) -> &str {
    line.strip_prefix('-')
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map_or(line, str::trim_start)
}

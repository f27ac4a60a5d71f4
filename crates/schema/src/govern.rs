//! Size governance for compact schema text.

/// Marker appended when the schema had to be hard-truncated.
pub const TRUNCATION_MARKER: &str = "\n[SCHEMA TRUNCATED - use search_schema to explore]";

/// Strip trailing ` # comment` annotations from rendered schema text.
pub fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| match line.find(" #") {
            Some(i) => &line[..i],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fit schema text into `max_chars`.
///
/// Over the ceiling, comments are stripped first; if the text still does not
/// fit, it is hard-truncated at a char boundary and a marker directs the
/// agent to the search tool instead.
pub fn govern_size(text: String, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text;
    }
    let stripped = strip_comments(&text);
    if stripped.len() <= max_chars {
        tracing::debug!(len = text.len(), max_chars, "schema over ceiling; comments stripped");
        return stripped;
    }
    tracing::debug!(len = stripped.len(), max_chars, "schema still over ceiling; hard truncating");

    let mut end = max_chars.min(stripped.len());
    while end > 0 && !stripped.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &stripped[..end], TRUNCATION_MARKER)
}

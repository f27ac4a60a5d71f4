//! Grep-like windowed search over the raw schema blob.
//!
//! The compact schema drops optional arguments and descriptions; this is the
//! escape hatch. Matches render as `lineNum:content`, context lines as
//! `lineNum-content`, and `offset` pages through schemas with many hits.

use regex::RegexBuilder;

/// Window and pagination controls for one search call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Lines shown before each match. With `after`, overrides `context`.
    pub before: usize,
    /// Lines shown after each match.
    pub after: usize,
    /// Symmetric window applied when `before` and `after` are both zero.
    pub context: usize,
    /// Number of leading matches to skip.
    pub offset: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { before: 0, after: 0, context: 10, offset: 0 }
    }
}

/// Search the blob line by line, case-insensitively.
///
/// Never fails: an invalid pattern or an empty result set comes back as
/// explanatory text, and `max_matches` bounds how many hits one call can
/// emit (continue with `offset`).
pub fn search_schema(
    blob: &str,
    pattern: &str,
    opts: &SearchOptions,
    max_matches: usize,
) -> String {
    let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => return format!("Invalid pattern: {e}"),
    };

    let lines: Vec<&str> = blob.lines().collect();
    let matches: Vec<usize> =
        (0..lines.len()).filter(|&i| regex.is_match(lines[i])).collect();

    if matches.len() <= opts.offset {
        if opts.offset > 0 {
            return format!(
                "No matches for '{pattern}' beyond offset {} ({} total).",
                opts.offset,
                matches.len()
            );
        }
        return format!("No matches found for '{pattern}'.");
    }

    let (before, after) = if opts.before == 0 && opts.after == 0 {
        (opts.context, opts.context)
    } else {
        (opts.before, opts.after)
    };

    let window = &matches[opts.offset..(opts.offset + max_matches).min(matches.len())];
    let mut blocks: Vec<String> = Vec::with_capacity(window.len());
    for &line_idx in window {
        let start = line_idx.saturating_sub(before);
        let end = (line_idx + after).min(lines.len().saturating_sub(1));
        let mut block = String::new();
        for i in start..=end {
            let marker = if i == line_idx { ':' } else { '-' };
            block.push_str(&format!("{}{marker}{}\n", i + 1, lines[i]));
        }
        blocks.push(block.trim_end().to_string());
    }

    let mut out = blocks.join("\n--\n");
    let shown = window.len();
    let remaining = matches.len() - opts.offset - shown;
    if remaining > 0 {
        out.push_str(&format!(
            "\n[{remaining} more matches - rerun with offset={}]",
            opts.offset + shown
        ));
    }
    out
}

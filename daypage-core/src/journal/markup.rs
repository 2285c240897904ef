//! Conversions between entry markup and plain text.
//!
//! Entry content is paragraph markup produced by the editor: one `<p>` per
//! line, with `<p><br></p>` for a blank line.

use crate::clock::local_datetime;
use regex::Regex;
use std::sync::OnceLock;

/// Markup for a blank line
pub const EMPTY_LINE: &str = "<p><br></p>";

fn empty_paragraph_break() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)<br\s*/?>\s*</p>").expect("valid pattern"))
}

fn line_break() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6]|blockquote|pre)\s*>").expect("valid pattern")
    })
}

fn any_tag() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid pattern"))
}

/// Plain text of `markup`, one line per paragraph
///
/// Block ends and `<br>` become newlines, other tags are dropped and the
/// common character entities are decoded. Surrounding whitespace is kept;
/// callers trim as needed.
pub fn strip_markup(markup: &str) -> String {
    let text = empty_paragraph_break().replace_all(markup, "</p>");
    let text = line_break().replace_all(&text, "\n");
    let text = any_tag().replace_all(&text, "");
    decode_entities(&text)
}

/// Whether `markup` has no visible text
pub fn is_blank(markup: &str) -> bool {
    strip_markup(markup).trim().is_empty()
}

/// Paragraph markup for plain text, one paragraph per line
pub fn plain_to_markup(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                EMPTY_LINE.to_string()
            } else {
                format!("<p>{}</p>", escape(line))
            }
        })
        .collect()
}

/// A paragraph holding the local time of `millis`, inserted after an idle
/// gap
pub fn timestamp_markup(millis: i64) -> String {
    format!("<p><em>{}</em></p>", local_datetime(millis).format("%H:%M"))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

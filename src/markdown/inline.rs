use html_escape::encode_double_quoted_attribute;
use regex::Regex;
use std::sync::LazyLock;

use super::render::escape_text;

/// `[text](url)` or `**bold**`
static INLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)]+)\)|\*\*([^*]+)\*\*").expect("valid inline regex")
});

/// A run of description text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSegment {
    Text(String),
    Link { text: String, url: String },
    Bold(String),
}

/// Split a one-line description into text, links and bold runs.
/// Descriptions are short prose, so only these two constructs are recognised.
pub fn parse_inline(text: &str) -> Vec<InlineSegment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in INLINE_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            segments.push(InlineSegment::Text(text[last..whole.start()].to_string()));
        }

        match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(label), Some(url), _) => segments.push(InlineSegment::Link {
                text: label.as_str().to_string(),
                url: url.as_str().to_string(),
            }),
            (_, _, Some(bold)) => segments.push(InlineSegment::Bold(bold.as_str().to_string())),
            _ => segments.push(InlineSegment::Text(whole.as_str().to_string())),
        }
        last = whole.end();
    }

    if last < text.len() {
        segments.push(InlineSegment::Text(text[last..].to_string()));
    }

    segments
}

pub fn inline_to_html(segments: &[InlineSegment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            InlineSegment::Text(text) => escape_text(text),
            InlineSegment::Link { text, url } => format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                encode_double_quoted_attribute(url),
                escape_text(text)
            ),
            InlineSegment::Bold(text) => format!("<strong>{}</strong>", escape_text(text)),
        })
        .collect()
}

//! Caption file (WebVTT, SRT) to plain text conversion.

use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

/// Whether a caption line carries no spoken text.
fn is_metadata_line(line: &str) -> bool {
    line.starts_with("WEBVTT")
        || line.starts_with("Kind:")
        || line.starts_with("Language:")
        || line.starts_with("NOTE")
        || is_timing_line(line)
}

fn is_timing_line(line: &str) -> bool {
    line.contains("-->")
}

/// An SRT cue number: digits only, directly followed by the cue's timing line.
fn is_cue_number(line: &str, next: Option<&&str>) -> bool {
    !line.is_empty()
        && line.chars().all(|c| c.is_ascii_digit())
        && next.is_some_and(|n| is_timing_line(n.trim()))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Flatten caption cues into one line of text.
///
/// Headers, cue numbers, timing lines and inline tags are dropped. A line
/// identical to the one before it is skipped, which removes the rolling
/// repeats of automatic captions.
pub fn captions_to_text(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_style_block = false;

    let mut raw_lines = raw.lines().peekable();
    while let Some(line) = raw_lines.next() {
        let line = line.trim();
        if line.is_empty() {
            in_style_block = false;
            continue;
        }
        if line == "STYLE" || line == "REGION" {
            in_style_block = true;
        }
        if in_style_block || is_metadata_line(line) || is_cue_number(line, raw_lines.peek()) {
            continue;
        }

        let text = decode_entities(&tag_regex().replace_all(line, ""));
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() || lines.last() == Some(&text) {
            continue;
        }
        lines.push(text);
    }

    lines.join(" ")
}

//! Layered parser for the generator's loosely-structured reply.
//!
//! The model is asked for a JSON array of strings but makes no schema
//! promise, so decoding is an ordered chain of strategies, first success
//! wins: strict JSON (with fence stripping), a bracketed-substring extract,
//! then a line heuristic.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Which decoding strategy produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// The reply (after fence stripping) parsed as a JSON array of strings.
    StrictJson,
    /// A `[...]` substring of the reply parsed as a JSON array of strings.
    ExtractedJson,
    /// Non-blank lines with bullet/number markers stripped.
    LineHeuristic,
}

/// Maximum number of subtasks kept from a reply.
pub const MAX_SUBTASKS: usize = 5;

static LINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    // Leading enumeration or bullet markers: "1. ", "2) ", "- ", "* ".
    Regex::new(r"^\s*(?:\d+\s*[.)]\s*|[-*]\s+)").unwrap()
});

/// Decode a reply into candidate subtask titles.
///
/// Returns the cleaned titles and the strategy that produced them, or
/// `None` when every layer comes up empty. Count validation (3..=5) is the
/// orchestrator's job, except that the line heuristic caps at
/// [`MAX_SUBTASKS`] by construction.
pub fn parse_subtasks(raw: &str) -> Option<(Vec<String>, ParseStrategy)> {
    if let Some(items) = parse_strict_json(raw) {
        return finish(items, ParseStrategy::StrictJson);
    }

    if let Some(items) = parse_extracted_json(raw) {
        return finish(items, ParseStrategy::ExtractedJson);
    }

    let items = parse_lines(raw);
    if !items.is_empty() {
        return finish(items, ParseStrategy::LineHeuristic);
    }

    None
}

fn finish(items: Vec<String>, strategy: ParseStrategy) -> Option<(Vec<String>, ParseStrategy)> {
    let cleaned: Vec<String> = items
        .iter()
        .map(|s| clean_item(s))
        .filter(|s| !s.is_empty())
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some((cleaned, strategy))
    }
}

/// Layer a: strip a surrounding fenced code block (optionally tagged
/// `json`) and parse the remainder as a JSON array of strings.
fn parse_strict_json(raw: &str) -> Option<Vec<String>> {
    let body = strip_code_fence(raw);
    serde_json::from_str::<Vec<String>>(body).ok()
}

/// Layer b: take the first `[` through the last `]` and parse that.
fn parse_extracted_json(raw: &str) -> Option<Vec<String>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Vec<String>>(&raw[start..=end]).ok()
}

/// Layer c: treat each non-blank, non-noise line as one subtask, stripping
/// enumeration markers and stray punctuation, keeping lines longer than 3
/// characters, capped at [`MAX_SUBTASKS`].
fn parse_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_noise_line(line))
        .map(strip_line_marker)
        .map(|line| {
            line.trim_matches(|c: char| matches!(c, '"' | '\'' | '[' | ']' | ','))
                .trim()
                .to_string()
        })
        .filter(|line| line.chars().count() > 3)
        .take(MAX_SUBTASKS)
        .collect()
}

fn strip_line_marker(line: &str) -> &str {
    match LINE_MARKER.find(line) {
        Some(m) if m.start() == 0 => &line[m.end()..],
        _ => line,
    }
}

/// Lines that look like fences, markdown headers, or lead-in prose
/// ("Here are the steps:") rather than steps.
fn is_noise_line(line: &str) -> bool {
    line.starts_with("```") || line.starts_with('#') || line.ends_with(':')
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Final cleanup applied to every item regardless of the producing layer:
/// stray quotes, commas and brackets are trimmed and escaped quotes are
/// unescaped.
fn clean_item(item: &str) -> String {
    item.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | ',' | '[' | ']'))
        .replace("\\\"", "\"")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_json_array_parses_strictly() {
        let (items, strategy) =
            parse_subtasks(r#"["Step one", "Step two", "Step three"]"#).unwrap();
        assert_eq!(strategy, ParseStrategy::StrictJson);
        assert_eq!(items, vec!["Step one", "Step two", "Step three"]);
    }

    #[test]
    fn fenced_json_block_parses_strictly() {
        let raw = "```json\n[\"A\",\"B\",\"C\",\"D\"]\n```";
        let (items, strategy) = parse_subtasks(raw).unwrap();
        assert_eq!(strategy, ParseStrategy::StrictJson);
        assert_eq!(items, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn untagged_fence_parses_strictly() {
        let raw = "```\n[\"one thing\", \"two thing\", \"red thing\"]\n```";
        let (items, strategy) = parse_subtasks(raw).unwrap();
        assert_eq!(strategy, ParseStrategy::StrictJson);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn embedded_array_is_extracted() {
        let raw = "Sure! Here is the plan: [\"Plan it\", \"Do it\", \"Ship it\"] Good luck!";
        let (items, strategy) = parse_subtasks(raw).unwrap();
        assert_eq!(strategy, ParseStrategy::ExtractedJson);
        assert_eq!(items, vec!["Plan it", "Do it", "Ship it"]);
    }

    #[test]
    fn numbered_lines_use_the_heuristic() {
        let raw = "1. Do X\n2. Do Y\n3. Do Z";
        let (items, strategy) = parse_subtasks(raw).unwrap();
        assert_eq!(strategy, ParseStrategy::LineHeuristic);
        assert_eq!(items, vec!["Do X", "Do Y", "Do Z"]);
    }

    #[test]
    fn bullet_lines_and_headers() {
        let raw = "Here are the steps:\n- Gather ingredients\n* Mix the batter\n- Bake at 180C\n```";
        let (items, strategy) = parse_subtasks(raw).unwrap();
        assert_eq!(strategy, ParseStrategy::LineHeuristic);
        assert_eq!(
            items,
            vec!["Gather ingredients", "Mix the batter", "Bake at 180C"]
        );
    }

    #[test]
    fn line_heuristic_caps_at_five() {
        let raw = "1. aaaa\n2. bbbb\n3. cccc\n4. dddd\n5. eeee\n6. ffff\n7. gggg";
        let (items, _) = parse_subtasks(raw).unwrap();
        assert_eq!(items.len(), MAX_SUBTASKS);
        assert_eq!(items[0], "aaaa");
        assert_eq!(items[4], "eeee");
    }

    #[test]
    fn short_lines_are_dropped() {
        let raw = "1. ok\n2. Do the real work\n3. Review the result\n4. Publish everything";
        let (items, _) = parse_subtasks(raw).unwrap();
        assert_eq!(items.len(), 3);
        assert!(!items.iter().any(|i| i == "ok"));
    }

    #[test]
    fn escaped_quotes_are_normalized() {
        let raw = "1. Read \\\"the manual\\\" first\n2. Apply the steps\n3. Verify the output";
        let (items, _) = parse_subtasks(raw).unwrap();
        assert_eq!(items[0], "Read \"the manual\" first");
    }

    #[test]
    fn empty_and_noise_only_input_yields_none() {
        assert!(parse_subtasks("").is_none());
        assert!(parse_subtasks("```\n```").is_none());
        assert!(parse_subtasks("# Heading\nSteps:").is_none());
    }

    #[test]
    fn non_string_array_falls_through_to_lines() {
        // [1, 2, 3] is a JSON array but not of strings, so both JSON layers
        // reject it and the line heuristic sees one bracket-stripped line.
        let (items, strategy) = parse_subtasks("[1, 2, 3]").unwrap();
        assert_eq!(strategy, ParseStrategy::LineHeuristic);
        assert_eq!(items, vec!["1, 2, 3"]);
    }
}

//! Text helpers: hashtag extraction, tag normalization and Unicode bold
//!
//! Platforms in the reference set have no rich-text markup, so `**bold**`
//! spans are rewritten into Mathematical Bold code points before submit.

use std::sync::LazyLock;

use regex::Regex;

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)(#[\p{L}\p{N}_]+)[\p{P}&&[^#@]]*").expect("hashtag pattern is valid"));

static BOLD_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").expect("bold pattern is valid"));

/// Body text and the hashtags pulled out of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub content: String,
    pub hashtags: Vec<String>,
}

/// Move every `#tag` token out of `raw` into a separate list
///
/// Tags are deduplicated keeping the order of first appearance. Whitespace
/// left behind by removed tags is collapsed per line, and punctuation glued
/// to a tag (`#new,`) is removed with it.
pub fn extract_hashtags(raw: &str) -> Extracted {
    let mut hashtags: Vec<String> = Vec::new();
    for caps in HASHTAG.captures_iter(raw) {
        let tag = caps[2].to_string();
        if !hashtags.contains(&tag) {
            hashtags.push(tag);
        }
    }

    let stripped = HASHTAG.replace_all(raw, "$1");
    let lines: Vec<String> = stripped
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    let content = lines.join("\n").trim().to_string();

    Extracted { content, hashtags }
}

/// Split free text on whitespace and keep tokens that start with `prefix`
pub fn normalize_tags(text: &str, prefix: char) -> Vec<String> {
    text.split_whitespace()
        .filter(|token| token.starts_with(prefix) && token.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Normalize a list whose entries may themselves hold several tokens
pub fn normalize_tag_list<S: AsRef<str>>(entries: &[S], prefix: char) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| normalize_tags(entry.as_ref(), prefix))
        .collect()
}

/// Ensure a single tag carries its prefix (`launch` -> `#launch`)
pub fn with_prefix(tag: &str, prefix: char) -> Option<String> {
    let tag = tag.trim();
    let bare = tag.trim_start_matches(prefix);
    if bare.is_empty() || bare.contains(char::is_whitespace) {
        return None;
    }
    Some(format!("{prefix}{bare}"))
}

/// Map one character to its Mathematical Bold counterpart when one exists
pub fn bold_char(c: char) -> char {
    let offset = match c {
        'A'..='Z' => 0x1D400 + (c as u32 - 'A' as u32),
        'a'..='z' => 0x1D41A + (c as u32 - 'a' as u32),
        '0'..='9' => 0x1D7CE + (c as u32 - '0' as u32),
        _ => return c,
    };
    char::from_u32(offset).unwrap_or(c)
}

pub fn to_unicode_bold(text: &str) -> String {
    text.chars().map(bold_char).collect()
}

/// Replace each `**span**` with Unicode bold glyphs; unmatched `**` stay literal
pub fn render_bold_markup(text: &str) -> String {
    BOLD_SPAN
        .replace_all(text, |caps: &regex::Captures<'_>| to_unicode_bold(&caps[1]))
        .into_owned()
}

//! # Text Helpers
//!
//! Slugs for every document key plus the counters behind reading times and the public
//! word/token counter tool.
//!
//! ## Counting Rules
//! - Word: whitespace separated run holding at least one letter or digit
//! - Sentence: run ending in `.`, `!` or `?` (a trailing run without one still counts)
//! - Paragraph: block separated by at least one blank line
//! - Token: roughly 4 characters, the usual rule of thumb for LLM tokenizers
//! - Reading time: 200 words per minute, rounded up
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const WORDS_PER_MINUTE: usize = 200;
pub const CHARS_PER_TOKEN: usize = 4;

static APOSTROPHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"['’]").unwrap());
static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

static MD_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static MD_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
static MD_BLOCK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(#{1,6}|>|[-*+]|\d+\.)\s+").unwrap());
static MD_INLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_`~]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, dash separated, ASCII only.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let s = APOSTROPHES.replace_all(&lowered, "");
    let s = NON_SLUG.replace_all(&s, "-");

    s.trim_matches('-').to_string()
}

/// First of `base`, `base-2`, `base-3`, ... that `taken` rejects.
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }

    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .count()
}

/// Whole minutes at 200 words per minute, at least 1 for any non-blank text.
pub fn reading_minutes(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }

    word_count(text).div_ceil(WORDS_PER_MINUTE).max(1)
}

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

fn sentence_count(text: &str) -> usize {
    SENTENCE_END
        .split(text)
        .filter(|run| run.chars().any(char::is_alphanumeric))
        .count()
}

fn paragraph_count(text: &str) -> usize {
    BLANK_LINE
        .split(&text.replace("\r\n", "\n"))
        .filter(|block| !block.trim().is_empty())
        .count()
}

/// Everything the counter tool reports for a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    pub tokens: usize,
    pub reading_minutes: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: word_count(text),
            characters: text.chars().count(),
            characters_no_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
            sentences: sentence_count(text),
            paragraphs: paragraph_count(text),
            tokens: estimate_tokens(text),
            reading_minutes: reading_minutes(text),
        }
    }
}

/// Strip the Markdown syntax that would leak into a plain text summary.
pub fn plain_text(markdown: &str) -> String {
    let s = MD_IMAGE.replace_all(markdown, "");
    let s = MD_LINK.replace_all(&s, "$1");
    let s = MD_BLOCK_PREFIX.replace_all(&s, "");
    let s = MD_INLINE.replace_all(&s, "");

    WHITESPACE.replace_all(&s, " ").trim().to_string()
}

/// Plain text of the first non-empty paragraph, cut on a word boundary.
pub fn excerpt(markdown: &str, max_chars: usize) -> String {
    let paragraph = BLANK_LINE
        .split(&markdown.replace("\r\n", "\n"))
        .map(plain_text)
        .find(|block| !block.is_empty())
        .unwrap_or_default();

    if paragraph.chars().count() <= max_chars {
        return paragraph;
    }

    let mut cut = String::new();
    for word in paragraph.split(' ') {
        let next_len = cut.chars().count() + word.chars().count() + usize::from(!cut.is_empty());
        if next_len > max_chars {
            break;
        }
        if !cut.is_empty() {
            cut.push(' ');
        }
        cut.push_str(word);
    }

    if cut.is_empty() {
        cut = paragraph.chars().take(max_chars).collect();
    }

    format!("{}…", cut.trim_end_matches(|c: char| c.is_ascii_punctuation()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  ChatGPT vs. Claude!  "), "chatgpt-vs-claude");
        assert_eq!(slugify("Don't Panic"), "dont-panic");
        assert_eq!(slugify("snake_case__name"), "snake-case-name");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_unique_slug() {
        let taken = ["intro", "intro-2"];
        assert_eq!(unique_slug("intro", |s| taken.contains(&s)), "intro-3");
        assert_eq!(unique_slug("outro", |s| taken.contains(&s)), "outro");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("one two  three\nfour"), 4);
        assert_eq!(word_count("a - b"), 2);
    }

    #[test]
    fn test_reading_minutes() {
        assert_eq!(reading_minutes(""), 0);
        assert_eq!(reading_minutes("   \n"), 0);
        assert_eq!(reading_minutes("short"), 1);
        assert_eq!(reading_minutes("!!! ---"), 1);
        assert_eq!(reading_minutes(&"word ".repeat(201)), 2);
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_text_stats() {
        let stats = TextStats::of("Hello there. How are you?\n\nFine!");
        assert_eq!(stats.words, 6);
        assert_eq!(stats.sentences, 3);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.characters, 32);
        assert_eq!(stats.characters_no_spaces, 26);
        assert_eq!(stats.tokens, 8);
        assert_eq!(stats.reading_minutes, 1);
    }

    #[test]
    fn test_plain_text_strips_markdown() {
        assert_eq!(
            plain_text("## A **bold** [link](https://x.dev) ![img](a.png)"),
            "A bold link"
        );
    }

    #[test]
    fn test_excerpt_skips_empty_blocks() {
        let md = "![cover](c.png)\n\nFirst real paragraph.\n\nSecond.";
        assert_eq!(excerpt(md, 160), "First real paragraph.");
    }

    #[test]
    fn test_excerpt_truncates_on_word_boundary() {
        assert_eq!(excerpt("alpha beta gamma delta", 12), "alpha beta…");
        assert_eq!(excerpt("alpha, beta gamma", 7), "alpha…");
    }
}

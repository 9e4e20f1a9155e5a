//! Markdown to HTML for post bodies, plus the heading list used as a table of contents.

use std::collections::HashSet;

use catalog::text::{slugify, unique_slug};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Headings in document order with unique anchors. Explicit `{#id}` attributes win.
pub fn headings(markdown: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut taken = HashSet::new();
    let mut current: Option<(u8, Option<String>, String)> = None;

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((level as u8, id.map(|id| id.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, buffer)) = current.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, id, text)) = current.take() {
                    let base = id.unwrap_or_else(|| slugify(&text));
                    let base = if base.is_empty() { "section".to_string() } else { base };
                    let anchor = unique_slug(&base, |candidate| taken.contains(candidate));
                    taken.insert(anchor.clone());

                    found.push(Heading {
                        level,
                        text: text.trim().to_string(),
                        anchor,
                    });
                }
            }
            _ => {}
        }
    }

    found
}

/// Render to HTML, giving every heading the anchor `headings` reports for it.
pub fn render(markdown: &str) -> String {
    let mut anchors = headings(markdown).into_iter().map(|h| h.anchor);

    let events = Parser::new_ext(markdown, options()).map(|event| match event {
        Event::Start(Tag::Heading {
            level,
            id: _,
            classes,
            attrs,
        }) => Event::Start(Tag::Heading {
            level,
            id: anchors.next().map(CowStr::from),
            classes,
            attrs,
        }),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic() {
        let html = render("Some *emphasis* and a [link](https://example.com).");
        assert_eq!(
            html,
            "<p>Some <em>emphasis</em> and a <a href=\"https://example.com\">link</a>.</p>\n"
        );
    }

    #[test]
    fn test_render_tables_and_strikethrough() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
    }

    #[test]
    fn test_headings_get_unique_anchors() {
        let md = "# Intro\n\ntext\n\n## Setup `cargo`\n\n## Intro\n\n### Extra {#custom}";
        let found = headings(md);

        let anchors: Vec<_> = found.iter().map(|h| h.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["intro", "setup-cargo", "intro-2", "custom"]);
        assert_eq!(found[1].text, "Setup cargo");
        assert_eq!(found[2].level, 2);
    }

    #[test]
    fn test_render_uses_heading_anchors() {
        let html = render("## Why Rust\n\n## Why Rust");
        assert!(html.contains("<h2 id=\"why-rust\">Why Rust</h2>"));
        assert!(html.contains("<h2 id=\"why-rust-2\">Why Rust</h2>"));
    }
}

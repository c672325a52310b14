//! Markdown rendering for text between tags.
//!
//! Uses pulldown-cmark with tables, strikethrough and task lists. Output is
//! split per top-level block so the preview can cut between blocks. Raw HTML
//! in the source is escaped rather than passed through.
//!
//! Each text run between tags is its own pulldown-cmark document, so a block
//! that a tag sits inside (a list item, a blockquote) is closed at the tag and
//! reopened after it. Link reference definitions are the exception: they are
//! gathered from every text run up front and resolve across tags.

use std::collections::HashMap;

use pulldown_cmark::{BrokenLink, CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Link reference definitions (`[label]: url "title"`) of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    links: HashMap<String, (String, String)>,
}

impl References {
    /// Gather definitions from every text run. Runs are separated by a blank
    /// line, the same boundary they are rendered with.
    pub fn collect<'s>(texts: impl IntoIterator<Item = &'s str>) -> Self {
        let joined = texts.into_iter().collect::<Vec<_>>().join("\n\n");
        let parser = Parser::new_ext(&joined, options());

        let mut links = HashMap::new();
        for (label, def) in parser.reference_definitions().iter() {
            let title = def.title.as_deref().unwrap_or_default().to_string();
            links
                .entry(normalize_label(label))
                .or_insert_with(|| (def.dest.to_string(), title));
        }
        Self { links }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn resolve<'a>(&self, label: &str) -> Option<(CowStr<'a>, CowStr<'a>)> {
        self.links
            .get(&normalize_label(label))
            .map(|(dest, title)| (CowStr::from(dest.clone()), CowStr::from(title.clone())))
    }
}

/// Case-insensitive, whitespace-collapsed label matching.
fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Render markdown to HTML, one string per top-level block.
///
/// Reference links whose definition lives in another text run resolve
/// through `references`.
pub fn render_blocks<'a>(markdown: &'a str, references: &References) -> Vec<String> {
    let resolve = |link: BrokenLink<'a>| -> Option<(CowStr<'a>, CowStr<'a>)> {
        references.resolve(&link.reference)
    };

    let mut blocks = Vec::new();
    let mut pending: Vec<Event<'a>> = Vec::new();
    let mut depth = 0usize;

    let parser = Parser::new_with_broken_link_callback(markdown, options(), Some(resolve));
    for event in parser.map(escape_raw_html) {
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        pending.push(event);

        if depth == 0 {
            let mut html_output = String::new();
            md_html::push_html(&mut html_output, pending.drain(..));
            blocks.push(html_output);
        }
    }

    blocks
}

fn escape_raw_html(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Start(Tag::HtmlBlock) => Event::Start(Tag::Paragraph),
        Event::End(TagEnd::HtmlBlock) => Event::End(TagEnd::Paragraph),
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> String {
        render_blocks(markdown, &References::default()).concat()
    }

    #[test]
    fn render_empty() {
        assert!(render_blocks("", &References::default()).is_empty());
        assert!(render_blocks("\n\n", &References::default()).is_empty());
    }

    #[test]
    fn render_plain_text() {
        assert_eq!(
            render_blocks("Hello, world!", &References::default()),
            ["<p>Hello, world!</p>\n"]
        );
    }

    #[test]
    fn render_splits_top_level_blocks() {
        let blocks = render_blocks("# H1\n\npara\n\n- a\n- b\n\n---\n", &References::default());
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0], "<h1>H1</h1>\n");
        assert_eq!(blocks[1], "<p>para</p>\n");
        assert!(blocks[2].starts_with("<ul>"));
        assert!(blocks[2].contains("<li>a</li>"));
        assert!(blocks[3].starts_with("<hr"));
    }

    #[test]
    fn render_blocks_concat_matches_single_pass() {
        let markdown = "# Title\n\nSome *text*.\n\n> quote\n\n1. one\n2. two\n";
        let mut whole = String::new();
        md_html::push_html(&mut whole, Parser::new_ext(markdown, options()));
        assert_eq!(render(markdown), whole);
    }

    #[test]
    fn render_bold_and_italic() {
        let result = render("**bold** and *italic*");
        assert!(result.contains("<strong>bold</strong>"));
        assert!(result.contains("<em>italic</em>"));
    }

    #[test]
    fn render_links() {
        let result = render("[click here](https://example.com)");
        assert!(result.contains("<a href=\"https://example.com\">click here</a>"));
    }

    #[test]
    fn render_code_block() {
        let result = render("```rust\nfn main() {}\n```");
        assert_eq!(render_blocks("```rust\nfn main() {}\n```", &References::default()).len(), 1);
        assert!(result.contains("<pre>"));
        assert!(result.contains("fn main() {}"));
    }

    #[test]
    fn render_ordered_list() {
        let result = render("1. first\n2. second");
        assert!(result.contains("<ol>"));
        assert!(result.contains("<li>first</li>"));
    }

    #[test]
    fn render_table() {
        let result = render("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(result.contains("<table>"));
        assert!(result.contains("<th>"));
        assert!(result.contains("<td>"));
    }

    #[test]
    fn render_strikethrough() {
        assert!(render("~~deleted~~").contains("<del>deleted</del>"));
    }

    #[test]
    fn render_raw_html_block_is_escaped() {
        let result = render("<script>alert(1)</script>");
        assert!(!result.contains("<script>"));
        assert!(result.contains("&lt;script&gt;"));
    }

    #[test]
    fn render_inline_html_is_escaped() {
        let result = render("a <b>bold</b> move");
        assert!(!result.contains("<b>"));
        assert!(result.contains("&lt;b&gt;"));
    }

    #[test]
    fn render_unicode() {
        let result = render("# 你好世界\n\nCafé ☕");
        assert!(result.contains("你好世界"));
        assert!(result.contains("Café ☕"));
    }

    #[test]
    fn references_resolve_across_runs() {
        let references = References::collect([
            "See [docs][1].",
            "More.\n\n[1]: https://example.com \"Docs\"",
        ]);
        assert_eq!(references.len(), 1);

        let first = render_blocks("See [docs][1].", &references).concat();
        assert_eq!(
            first,
            "<p>See <a href=\"https://example.com\" title=\"Docs\">docs</a>.</p>\n"
        );

        let second = render_blocks("More.\n\n[1]: https://example.com \"Docs\"", &references);
        assert_eq!(second, ["<p>More.</p>\n"]);
    }

    #[test]
    fn reference_labels_match_case_insensitively() {
        let references = References::collect(["[Rust  Lang]: https://rust-lang.org"]);
        let html = render_blocks("[the language][rust lang] and [RUST LANG]", &references).concat();
        assert_eq!(
            html,
            "<p><a href=\"https://rust-lang.org\">the language</a> and \
             <a href=\"https://rust-lang.org\">RUST LANG</a></p>\n"
        );
    }

    #[test]
    fn unknown_reference_stays_text() {
        let html = render_blocks("[docs][missing]", &References::default()).concat();
        assert_eq!(html, "<p>[docs][missing]</p>\n");
    }

    #[test]
    fn reference_inside_code_block_is_not_collected() {
        let references = References::collect(["```\n[1]: https://example.com\n```"]);
        assert!(references.is_empty());
    }
}

//! HTML serialization and preview truncation.
//!
//! Figures are generated with [maud](https://maud.lambda.xyz/), so every
//! attribute value is escaped. Markdown blocks arrive already rendered.

use maud::{Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parse::parse;
use crate::transform::{Figure, Renderable, transform};

/// Prefix prepended to every image source path.
pub const DEFAULT_ASSET_PREFIX: &str = "/assets";

/// Static rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub asset_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
        }
    }
}

/// Full and preview HTML for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rendered {
    pub html: String,
    /// Everything before the first top-level border, or `html` if none.
    pub html_preview: String,
}

/// Renders raw markup into [`Rendered`] output.
///
/// Holds only immutable options; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct ContentRenderer {
    options: RenderOptions,
}

impl ContentRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Parse, resolve tags and produce both HTML strings.
    pub fn render(&self, raw: &str) -> Result<Rendered> {
        let document = parse(raw)?;
        let transformed = transform(&document)?;

        for issue in &transformed.issues {
            tracing::warn!(
                tag = %issue.tag,
                attribute = ?issue.attribute,
                level = %issue.level,
                location = %issue.location,
                message = %issue.message,
                "content schema issue"
            );
        }

        let prefix = &self.options.asset_prefix;
        let html = to_html(&transformed.nodes, prefix);
        let html_preview = match preview(&transformed.nodes) {
            Some(nodes) => to_html(nodes, prefix),
            None => html.clone(),
        };

        Ok(Rendered { html, html_preview })
    }
}

/// Nodes strictly before the first top-level border, if there is one.
pub fn preview(nodes: &[Renderable]) -> Option<&[Renderable]> {
    nodes
        .iter()
        .position(|node| matches!(node, Renderable::Border))
        .map(|index| &nodes[..index])
}

/// Serialize a node sequence to HTML.
pub fn to_html(nodes: &[Renderable], asset_prefix: &str) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Renderable::Markup(html) => out.push_str(html),
            Renderable::Image(fig) => out.push_str(&figure(fig, asset_prefix).into_string()),
            Renderable::Border => {}
        }
    }
    out
}

fn figure(fig: &Figure, prefix: &str) -> Markup {
    html! {
        figure {
            picture {
                @if let Some(avif) = &fig.avif {
                    source srcset={ (prefix) (avif) } type="image/avif";
                }
                @if let Some(jpg) = &fig.jpg {
                    img src={ (prefix) (jpg) } alt=[fig.alt.as_deref()];
                }
                @if let Some(png) = &fig.png {
                    img src={ (prefix) (png) } alt=[fig.alt.as_deref()];
                }
            }
            @if fig.has_caption() {
                figcaption { (PreEscaped(to_html(&fig.caption, prefix))) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContentError, ErrorLevel};

    fn render(raw: &str) -> Rendered {
        ContentRenderer::default().render(raw).unwrap()
    }

    #[test]
    fn render_empty_input() {
        let out = render("");
        assert_eq!(out.html, "");
        assert_eq!(out.html_preview, "");
    }

    #[test]
    fn preview_equals_html_without_border() {
        let out = render("# Title\n\nOne\n\n{% image urls=[\"/a.jpg\"] /%}\n\nTwo");
        assert!(!out.html.is_empty());
        assert_eq!(out.html_preview, out.html);
    }

    #[test]
    fn preview_stops_before_border() {
        let raw = "# Title\n\n{% image urls=[\"/a.jpg\"] %}{% /image %}\n\n{% border %}{% /border %}\n\nHidden paragraph";
        let out = render(raw);
        assert_eq!(
            out.html,
            "<h1>Title</h1>\n\
             <figure><picture><img src=\"/assets/a.jpg\"></picture></figure>\
             <p>Hidden paragraph</p>\n"
        );
        assert_eq!(
            out.html_preview,
            "<h1>Title</h1>\n<figure><picture><img src=\"/assets/a.jpg\"></picture></figure>"
        );
        assert!(out.html.starts_with(&out.html_preview));
    }

    #[test]
    fn preview_uses_first_border_only() {
        let out = render("one\n\n{% border /%}\n\ntwo\n\n{% border /%}\n\nthree");
        assert_eq!(out.html_preview, "<p>one</p>\n");
        assert_eq!(out.html, "<p>one</p>\n<p>two</p>\n<p>three</p>\n");
    }

    #[test]
    fn border_first_gives_empty_preview() {
        let out = render("{% border /%}\n\nbody");
        assert_eq!(out.html_preview, "");
        assert_eq!(out.html, "<p>body</p>\n");
    }

    #[test]
    fn border_mid_paragraph_splits_text() {
        let out = render("shown {% border /%} hidden");
        assert_eq!(out.html_preview, "<p>shown</p>\n");
        assert!(out.html.contains("hidden"));
    }

    #[test]
    fn nested_border_does_not_truncate() {
        let out = render("{% image urls=[\"/a.jpg\"] %}{% border /%}{% /image %}\n\nafter");
        assert_eq!(out.html_preview, out.html);
        assert!(!out.html.contains("<figcaption>"));
    }

    #[test]
    fn reference_link_defined_after_border() {
        let out = render("See [docs][1].\n\n{% border /%}\n\nMore.\n\n[1]: https://example.com\n");
        assert!(out.html.contains("<a href=\"https://example.com\">docs</a>"));
        assert_eq!(
            out.html_preview,
            "<p>See <a href=\"https://example.com\">docs</a>.</p>\n"
        );
    }

    #[test]
    fn reference_link_in_caption_resolves() {
        let out = render("{% image urls=[\"/a.jpg\"] %}by [me][home]{% /image %}\n\n[home]: /about\n");
        assert!(out.html.contains("<figcaption><p>by <a href=\"/about\">me</a></p>"));
    }

    #[test]
    fn tag_inside_list_item_splits_list() {
        let out = render("- a\n- b\n  {% image urls=[\"/x.jpg\"] /%}\n- c\n");
        assert_eq!(out.html.matches("<ul>").count(), 2);

        let figure = out.html.find("<figure>").unwrap();
        let first_list_end = out.html.find("</ul>").unwrap();
        let second_list = out.html.rfind("<ul>").unwrap();
        assert!(first_list_end < figure && figure < second_list);
        assert!(out.html[..figure].contains("<li>b</li>"));
        assert!(out.html[second_list..].contains("<li>c</li>"));
    }

    #[test]
    fn figure_with_all_sources_alt_and_caption() {
        let out = render(
            "{% image urls=[\"/p/a.jpg\", \"/p/a.png\", \"/p/a.avif\"] alt=\"A \\\"quoted\\\" cat\" %}\nNice cat\n{% /image %}",
        );
        assert_eq!(
            out.html,
            "<figure><picture>\
             <source srcset=\"/assets/p/a.avif\" type=\"image/avif\">\
             <img src=\"/assets/p/a.jpg\" alt=\"A &quot;quoted&quot; cat\">\
             <img src=\"/assets/p/a.png\" alt=\"A &quot;quoted&quot; cat\">\
             </picture><figcaption><p>Nice cat</p>\n</figcaption></figure>"
        );
    }

    #[test]
    fn custom_asset_prefix() {
        let renderer = ContentRenderer::new(RenderOptions {
            asset_prefix: "https://cdn.example.com".to_string(),
        });
        let out = renderer.render("{% image urls=[\"/a.png\"] /%}").unwrap();
        assert!(out.html.contains("src=\"https://cdn.example.com/a.png\""));
    }

    #[test]
    fn render_is_idempotent() {
        let raw = "# T\n\n{% image urls=[\"/a.avif\", \"/a.jpg\"] alt=\"x\" %}cap{% /image %}\n\n{% border /%}\n\nrest";
        let renderer = ContentRenderer::default();
        assert_eq!(renderer.render(raw).unwrap(), renderer.render(raw).unwrap());
    }

    #[test]
    fn empty_urls_fails_render() {
        let err = ContentRenderer::default()
            .render("{% image urls=[] %}{% /image %}")
            .unwrap_err();
        match err {
            ContentError::SchemaValidation(issue) => assert_eq!(issue.level, ErrorLevel::Critical),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_markup_fails_render() {
        let err = ContentRenderer::default()
            .render("{% image urls=[\"/a.jpg\"] %}")
            .unwrap_err();
        assert!(matches!(err, ContentError::Parse { .. }));
    }

    #[test]
    fn non_critical_issue_still_renders() {
        let out = render("{% image urls=[\"/a.jpg\"] alt=false /%}");
        assert_eq!(
            out.html,
            "<figure><picture><img src=\"/assets/a.jpg\"></picture></figure>"
        );
    }

    #[test]
    fn rendered_serializes_camel_case() {
        let json = serde_json::to_value(render("hi\n\n{% border /%}\n\nmore")).unwrap();
        assert_eq!(json["html"], "<p>hi</p>\n<p>more</p>\n");
        assert_eq!(json["htmlPreview"], "<p>hi</p>\n");
    }

    #[test]
    fn preview_slice_helper() {
        let nodes = vec![
            Renderable::Markup("a".to_string()),
            Renderable::Border,
            Renderable::Markup("b".to_string()),
        ];
        assert_eq!(preview(&nodes), Some(&nodes[..1]));
        assert_eq!(preview(&nodes[2..]), None);
    }
}

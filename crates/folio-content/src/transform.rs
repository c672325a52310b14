//! Tag resolution: turns a parsed [`Document`] into renderable nodes.

use serde_json::Value;

use crate::ast::{Document, Node, TagNode};
use crate::error::{ContentError, ErrorLevel, Result, ValidationIssue};
use crate::markdown;
use crate::schema::{self, AttributeSchema, TagKind, TagSchema};

/// File extensions an image source may have, in `<picture>` order.
pub const IMAGE_EXTENSIONS: [&str; 3] = [".avif", ".jpg", ".png"];

/// A rendered node of the top-level sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderable {
    /// HTML of one markdown block.
    Markup(String),
    Image(Figure),
    /// Preview cut point. Renders nothing.
    Border,
}

/// A resolved `image` tag. Source paths are relative to the asset prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Figure {
    pub avif: Option<String>,
    pub jpg: Option<String>,
    pub png: Option<String>,
    pub alt: Option<String>,
    pub caption: Vec<Renderable>,
}

impl Figure {
    pub fn has_caption(&self) -> bool {
        self.caption
            .iter()
            .any(|node| !matches!(node, Renderable::Border))
    }
}

/// Output of [`transform`]: the node sequence plus non-critical issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformed {
    pub nodes: Vec<Renderable>,
    pub issues: Vec<ValidationIssue>,
}

/// Resolve every node under the document root.
///
/// Critical schema violations abort with [`ContentError::SchemaValidation`];
/// anything less severe is collected in [`Transformed::issues`].
pub fn transform(document: &Document) -> Result<Transformed> {
    let mut sources = Vec::new();
    text_sources(&document.children, &mut sources);

    let mut transformer = Transformer {
        references: markdown::References::collect(sources),
        issues: Vec::new(),
    };
    let nodes = transformer.nodes(&document.children)?;
    Ok(Transformed {
        nodes,
        issues: transformer.issues,
    })
}

/// Every text run in document order, including those inside tags.
fn text_sources<'d>(nodes: &'d [Node], out: &mut Vec<&'d str>) {
    for node in nodes {
        match node {
            Node::Text { source, .. } => out.push(source.as_str()),
            Node::Tag(tag) => text_sources(&tag.children, out),
        }
    }
}

struct Transformer {
    references: markdown::References,
    issues: Vec<ValidationIssue>,
}

impl Transformer {
    fn nodes(&mut self, nodes: &[Node]) -> Result<Vec<Renderable>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Text { source, .. } => {
                    out.extend(
                        markdown::render_blocks(source, &self.references)
                            .into_iter()
                            .map(Renderable::Markup),
                    );
                }
                Node::Tag(tag) => out.push(self.tag(tag)?),
            }
        }
        Ok(out)
    }

    fn tag(&mut self, tag: &TagNode) -> Result<Renderable> {
        let Some(schema) = schema::lookup(&tag.name) else {
            return Err(ContentError::SchemaValidation(issue(
                tag,
                None,
                schema::UNDEFINED_TAG_LEVEL,
                "undefined tag",
            )));
        };

        let attributes = self.attributes(schema, tag)?;

        match schema.kind {
            TagKind::Image => self.image(tag, &attributes),
            TagKind::Border => {
                if !schema.accepts_children && has_content(&tag.children) {
                    self.report(tag, None, ErrorLevel::Warning, "children are ignored")?;
                }
                Ok(Renderable::Border)
            }
        }
    }

    /// Check attributes against the schema, keeping the ones that pass.
    fn attributes<'t>(
        &mut self,
        schema: &TagSchema,
        tag: &'t TagNode,
    ) -> Result<Vec<(&'static AttributeSchema, &'t Value)>> {
        let mut accepted = Vec::with_capacity(tag.attributes.len());

        for (name, value) in &tag.attributes {
            match schema.attribute(name) {
                None => self.report(
                    tag,
                    Some(name.as_str()),
                    schema::UNDEFINED_ATTRIBUTE_LEVEL,
                    "undefined attribute",
                )?,
                Some(attr) if !attr.ty.matches(value) => self.report(
                    tag,
                    Some(name.as_str()),
                    attr.level,
                    format!("expected {}, found {}", attr.ty.name(), type_name(value)),
                )?,
                Some(attr) => accepted.push((attr, value)),
            }
        }

        for attr in schema.attributes.iter().filter(|attr| attr.required) {
            if tag.attribute(attr.name).is_none() {
                self.report(tag, Some(attr.name), attr.level, "missing required attribute")?;
            }
        }

        Ok(accepted)
    }

    fn image(
        &mut self,
        tag: &TagNode,
        attributes: &[(&'static AttributeSchema, &Value)],
    ) -> Result<Renderable> {
        let find = |name: &str| {
            attributes
                .iter()
                .find(|(attr, _)| attr.name == name)
                .map(|(attr, value)| (*attr, *value))
        };

        let mut urls: Vec<&str> = Vec::new();
        if let Some((attr, Value::Array(items))) = find("urls") {
            for item in items {
                match item.as_str() {
                    Some(url) => urls.push(url),
                    None => self.report(
                        tag,
                        Some(attr.name),
                        attr.level,
                        format!("expected array of strings, found {}", type_name(item)),
                    )?,
                }
            }
        }

        let [avif, jpg, png] = IMAGE_EXTENSIONS.map(|ext| first_with_extension(&urls, ext));
        if avif.is_none() && jpg.is_none() && png.is_none() {
            return Err(ContentError::SchemaValidation(issue(
                tag,
                Some("urls"),
                ErrorLevel::Critical,
                "no .avif, .jpg, or .png source",
            )));
        }

        let figure = Figure {
            avif,
            jpg,
            png,
            alt: find("alt")
                .and_then(|(_, value)| value.as_str())
                .map(str::to_string),
            caption: self.nodes(&tag.children)?,
        };
        Ok(Renderable::Image(figure))
    }

    /// Record a schema issue; critical ones become the error.
    fn report(
        &mut self,
        tag: &TagNode,
        attribute: Option<&str>,
        level: ErrorLevel,
        message: impl Into<String>,
    ) -> Result<()> {
        let issue = issue(tag, attribute, level, message);
        if level == ErrorLevel::Critical {
            return Err(ContentError::SchemaValidation(issue));
        }
        self.issues.push(issue);
        Ok(())
    }
}

fn issue(
    tag: &TagNode,
    attribute: Option<&str>,
    level: ErrorLevel,
    message: impl Into<String>,
) -> ValidationIssue {
    ValidationIssue {
        tag: tag.name.clone(),
        attribute: attribute.map(str::to_string),
        level,
        message: message.into(),
        location: tag.location,
    }
}

/// First URL with the given extension, in source order.
fn first_with_extension(urls: &[&str], ext: &str) -> Option<String> {
    urls.iter()
        .find(|url| url.ends_with(ext))
        .map(|url| url.to_string())
}

fn has_content(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Text { source, .. } => !source.trim().is_empty(),
        Node::Tag(_) => true,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::parse::parse;

    fn run(source: &str) -> Result<Transformed> {
        transform(&parse(source).unwrap())
    }

    fn schema_error(source: &str) -> ValidationIssue {
        match run(source) {
            Err(ContentError::SchemaValidation(issue)) => issue,
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    fn figure(node: &Renderable) -> &Figure {
        match node {
            Renderable::Image(figure) => figure,
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn markdown_blocks_become_markup_nodes() {
        let out = run("# Title\n\nBody").unwrap();
        assert_eq!(
            out.nodes,
            vec![
                Renderable::Markup("<h1>Title</h1>\n".to_string()),
                Renderable::Markup("<p>Body</p>\n".to_string()),
            ]
        );
        assert!(out.issues.is_empty());
    }

    #[test]
    fn image_picks_one_source_per_format() {
        let out = run(
            r#"{% image urls=["/a.png", "/a.avif", "/a.jpg", "/b.jpg"] alt="A cat" %}{% /image %}"#,
        )
        .unwrap();
        let fig = figure(&out.nodes[0]);
        assert_eq!(fig.avif.as_deref(), Some("/a.avif"));
        assert_eq!(fig.jpg.as_deref(), Some("/a.jpg"));
        assert_eq!(fig.png.as_deref(), Some("/a.png"));
        assert_eq!(fig.alt.as_deref(), Some("A cat"));
        assert!(!fig.has_caption());
    }

    #[test]
    fn image_ignores_other_extensions() {
        let out = run(r#"{% image urls=["/a.gif", "/a.jpg"] /%}"#).unwrap();
        let fig = figure(&out.nodes[0]);
        assert_eq!(fig.jpg.as_deref(), Some("/a.jpg"));
        assert!(fig.avif.is_none());
        assert!(fig.png.is_none());
    }

    #[test]
    fn image_children_become_caption() {
        let out = run("{% image urls=[\"/a.jpg\"] %}\nA *caption*\n{% /image %}").unwrap();
        let fig = figure(&out.nodes[0]);
        assert!(fig.has_caption());
        assert_eq!(
            fig.caption,
            vec![Renderable::Markup(
                "<p>A <em>caption</em></p>\n".to_string()
            )]
        );
    }

    #[test]
    fn whitespace_children_are_no_caption() {
        let out = run("{% image urls=[\"/a.jpg\"] %}\n\n{% /image %}").unwrap();
        assert!(!figure(&out.nodes[0]).has_caption());
    }

    #[test]
    fn border_resolves_to_marker() {
        let out = run("{% border %}{% /border %}").unwrap();
        assert_eq!(out.nodes, vec![Renderable::Border]);
        assert!(out.issues.is_empty());
    }

    #[test]
    fn border_children_are_dropped_with_warning() {
        let out = run("{% border %}\nhidden\n{% /border %}").unwrap();
        assert_eq!(out.nodes, vec![Renderable::Border]);
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].level, ErrorLevel::Warning);
    }

    #[test]
    fn undefined_tag_is_critical() {
        let issue = schema_error("text\n\n{% gallery /%}");
        assert_eq!(issue.tag, "gallery");
        assert_eq!(issue.level, ErrorLevel::Critical);
        assert_eq!(issue.location, Location::new(3, 1));
    }

    #[test]
    fn missing_urls_is_critical() {
        let issue = schema_error("{% image alt=\"x\" %}{% /image %}");
        assert_eq!(issue.attribute.as_deref(), Some("urls"));
        assert_eq!(issue.level, ErrorLevel::Critical);
        assert!(issue.message.contains("missing required attribute"));
    }

    #[test]
    fn urls_of_wrong_type_is_critical() {
        let issue = schema_error("{% image urls=\"/a.jpg\" /%}");
        assert_eq!(issue.attribute.as_deref(), Some("urls"));
        assert!(issue.message.contains("expected array, found string"));
    }

    #[test]
    fn urls_with_non_string_entry_is_critical() {
        let issue = schema_error("{% image urls=[\"/a.jpg\", 3] /%}");
        assert!(issue.message.contains("found number"));
    }

    #[test]
    fn empty_urls_is_critical() {
        let issue = schema_error("{% image urls=[] %}{% /image %}");
        assert_eq!(issue.level, ErrorLevel::Critical);
        assert!(issue.message.contains("no .avif, .jpg, or .png source"));
    }

    #[test]
    fn urls_without_known_format_is_critical() {
        let issue = schema_error("{% image urls=[\"/a.webp\"] /%}");
        assert_eq!(issue.attribute.as_deref(), Some("urls"));
    }

    #[test]
    fn alt_of_wrong_type_is_reported_and_dropped() {
        let out = run("{% image urls=[\"/a.jpg\"] alt=5 /%}").unwrap();
        assert!(figure(&out.nodes[0]).alt.is_none());
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].level, ErrorLevel::Error);
        assert_eq!(out.issues[0].attribute.as_deref(), Some("alt"));
    }

    #[test]
    fn undefined_attribute_is_reported() {
        let out = run("{% border width=3 /%}").unwrap();
        assert_eq!(out.nodes, vec![Renderable::Border]);
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].message, "undefined attribute");
    }

    #[test]
    fn nested_border_stays_inside_caption() {
        let out = run("{% image urls=[\"/a.jpg\"] %}{% border /%}{% /image %}").unwrap();
        assert_eq!(out.nodes.len(), 1);
        let fig = figure(&out.nodes[0]);
        assert_eq!(fig.caption, vec![Renderable::Border]);
        assert!(!fig.has_caption());
    }
}

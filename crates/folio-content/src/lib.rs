//! Folio Content - markup rendering for site posts.
//!
//! Converts post markup (markdown plus `{% tag %}` blocks) into static HTML,
//! along with a preview rendering that ends at the first `border` tag.
//!
//! # Pipeline
//!
//! - **Parse**: find tag headers, parse their attributes, nest text and tags
//!   under a [`Document`] root
//! - **Transform**: resolve tags through the static [`schema::TAGS`] table and
//!   render markdown blocks with pulldown-cmark
//! - **Render**: serialize the node sequence, once in full and once up to the
//!   first top-level border
//!
//! # Tags
//!
//! ```text
//! {% image urls=["/2024/cat.avif", "/2024/cat.jpg"] alt="A cat" %}
//! Optional *caption*
//! {% /image %}
//!
//! {% border /%}
//! ```
//!
//! # Example
//!
//! ```
//! let out = folio_content::render("Intro\n\n{% border /%}\n\nThe rest").unwrap();
//! assert_eq!(out.html_preview, "<p>Intro</p>\n");
//! assert_eq!(out.html, "<p>Intro</p>\n<p>The rest</p>\n");
//! ```

pub mod ast;
mod error;
mod markdown;
pub mod parse;
pub mod render;
pub mod schema;
pub mod transform;

pub use ast::{Document, Node, TagNode};
pub use error::{ContentError, ErrorLevel, Location, Result, ValidationIssue};
pub use parse::parse;
pub use render::{ContentRenderer, DEFAULT_ASSET_PREFIX, RenderOptions, Rendered};
pub use transform::{Figure, Renderable, Transformed, transform};

/// Render with default options.
pub fn render(raw: &str) -> Result<Rendered> {
    ContentRenderer::default().render(raw)
}

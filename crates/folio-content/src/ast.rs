//! Parsed markup tree.
//!
//! Parsing always yields a [`Document`] root container. Everything
//! downstream operates on `Document::children`; the root itself never
//! renders.

use serde_json::Value;

use crate::error::Location;

/// Root container produced by [`crate::parse`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A top-level or nested node of the parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Markdown source between tags, rendered with the dialect's default rules.
    Text { source: String, location: Location },
    /// A `{% name ... %}` tag with its children.
    Tag(TagNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagNode {
    pub name: String,
    /// Attributes in source order. Names are unique.
    pub attributes: Vec<(String, Value)>,
    pub children: Vec<Node>,
    pub location: Location,
}

impl TagNode {
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

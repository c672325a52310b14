//! Static tag vocabulary.
//!
//! Tag names resolve through [`TAGS`] to a closed [`TagKind`]. Anything that
//! is not a tag renders with the markdown defaults.

use serde_json::Value;

use crate::error::ErrorLevel;

/// Custom tags understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Responsive `<figure>` with AVIF/JPG/PNG sources and optional caption.
    Image,
    /// Zero-content marker that ends the preview.
    Border,
}

/// Declared type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Array,
}

impl AttributeType {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Array => value.is_array(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Array => "array",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub ty: AttributeType,
    pub required: bool,
    /// Severity of a violation on this attribute.
    pub level: ErrorLevel,
}

#[derive(Debug, Clone, Copy)]
pub struct TagSchema {
    pub name: &'static str,
    pub kind: TagKind,
    pub attributes: &'static [AttributeSchema],
    /// Whether children are rendered (as a caption for images).
    pub accepts_children: bool,
}

impl TagSchema {
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeSchema> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

const IMAGE_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema {
        name: "urls",
        ty: AttributeType::Array,
        required: true,
        level: ErrorLevel::Critical,
    },
    AttributeSchema {
        name: "alt",
        ty: AttributeType::String,
        required: false,
        level: ErrorLevel::Error,
    },
];

/// Tag lookup table.
pub static TAGS: &[TagSchema] = &[
    TagSchema {
        name: "image",
        kind: TagKind::Image,
        attributes: IMAGE_ATTRIBUTES,
        accepts_children: true,
    },
    TagSchema {
        name: "border",
        kind: TagKind::Border,
        attributes: &[],
        accepts_children: false,
    },
];

/// Severity of a tag name missing from [`TAGS`].
pub const UNDEFINED_TAG_LEVEL: ErrorLevel = ErrorLevel::Critical;

/// Severity of an attribute that the tag does not declare.
pub const UNDEFINED_ATTRIBUTE_LEVEL: ErrorLevel = ErrorLevel::Error;

pub fn lookup(name: &str) -> Option<&'static TagSchema> {
    TAGS.iter().find(|schema| schema.name == name)
}

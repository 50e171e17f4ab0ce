//! Rich-text delta content model.
//!
//! A document's content is an ordered sequence of operations, each inserting
//! either a run of text (optionally styled) or an embedded object such as an
//! image. The controller treats content as opaque beyond passing it through;
//! this module only provides construction helpers, plain-text extraction, and
//! length accounting for caret clamping.
//!
//! Lengths are measured in characters, with embeds counting as one character,
//! matching the editing surface's selection semantics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Styling attributes attached to an operation (bold, color, link, ...).
pub type Attributes = IndexMap<String, Value>;

/// A single rich-text operation.
///
/// String inserts carry text; object inserts carry embeds and are opaque to
/// everything except length accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaOp {
    /// The inserted content: a string, or an object for embeds.
    pub insert: Value,

    /// Styling attributes, omitted when the run is unstyled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl DeltaOp {
    /// Create an unstyled text insert.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            insert: Value::String(text.into()),
            attributes: None,
        }
    }

    /// Create a styled text insert.
    pub fn styled(text: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            insert: Value::String(text.into()),
            attributes: Some(attributes),
        }
    }

    /// The op's text, if it is a string insert.
    pub fn as_text(&self) -> Option<&str> {
        self.insert.as_str()
    }

    /// Length of this op in characters (embeds count as one).
    pub fn len(&self) -> usize {
        match self.insert.as_str() {
            Some(s) => s.chars().count(),
            None => 1,
        }
    }

    /// Whether this op inserts nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self.insert.as_str(), Some(""))
    }
}

/// An ordered sequence of rich-text operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(pub Vec<DeltaOp>);

impl Delta {
    /// Create an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a delta holding a single unstyled text insert.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::new()
        } else {
            Self(vec![DeltaOp::text(text)])
        }
    }

    /// The operations in order.
    pub fn ops(&self) -> &[DeltaOp] {
        &self.0
    }

    /// Append an operation.
    pub fn push(&mut self, op: DeltaOp) {
        self.0.push(op);
    }

    /// Whether the delta holds no operations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total length in characters (embeds count as one).
    pub fn len(&self) -> usize {
        self.0.iter().map(DeltaOp::len).sum()
    }

    /// Plain-text extraction: string inserts concatenated in order, embeds
    /// and styling discarded.
    pub fn plain_text(&self) -> String {
        self.0
            .iter()
            .filter_map(DeltaOp::as_text)
            .collect::<Vec<_>>()
            .concat()
    }
}

impl From<Vec<DeltaOp>> for Delta {
    fn from(ops: Vec<DeltaOp>) -> Self {
        Self(ops)
    }
}

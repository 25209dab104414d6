//! Parse events exchanged between the event source and the decoder

use indexmap::IndexMap;

/// One low-level XML parse event
///
/// The event source is expected to have validated lexical well-formedness
/// already (matching tags, encoding); the decoder still checks tag balance
/// defensively. Attributes are carried through but not interpreted by the
/// decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// An opening tag, with its attributes in document order
    StartElement {
        name: String,
        attributes: IndexMap<String, String>,
    },
    /// Character data between tags
    Characters(String),
    /// A closing tag
    EndElement(String),
}

impl Event {
    /// Shorthand for a start event with no attributes
    pub fn start(name: impl Into<String>) -> Self {
        Self::StartElement {
            name: name.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Shorthand for a characters event
    pub fn text(text: impl Into<String>) -> Self {
        Self::Characters(text.into())
    }

    /// Shorthand for an end event
    pub fn end(name: impl Into<String>) -> Self {
        Self::EndElement(name.into())
    }
}

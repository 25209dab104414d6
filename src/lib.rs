//! saxtree - event-driven XML decoder producing dynamic value trees
//!
//! A push-driven state machine rebuilds a nested, dynamically-typed value
//! graph (scalars, ordered sequences, key-ordered mappings) from SAX-style
//! parse events. Repeated sibling element names are promoted to sequences;
//! everything else becomes a mapping entry or scalar text, inferred purely
//! from the shape of the event stream.
//!
//! # Quick Start
//!
//! ```
//! use saxtree::from_str;
//! # fn main() -> Result<(), saxtree::Error> {
//! let value = from_str("<person><name>Al</name><age>5</age></person>")?;
//! let name = value
//!     .as_mapping()
//!     .and_then(|map| map.get("name"))
//!     .and_then(|v| v.as_text())
//!     .unwrap_or_default();
//! assert_eq!(name, "Al");
//! # Ok(())
//! # }
//! ```
//!
//! The decoder can also be driven directly by any event source honoring the
//! [`Event`] contract; [`Tokenizer`] is the bundled reference source.

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod value;
pub use value::{Mapping, Sequence, Value};

pub mod event;
pub use event::Event;

pub mod decoder;
pub use decoder::{Config, Decoder, MixedContentPolicy, WhitespacePolicy};

pub mod tokenizer;
pub use tokenizer::Tokenizer;

pub mod writer;
pub use writer::write_xml;

/// Decode an XML document from a string
pub fn from_str(s: &str) -> Result<Value> {
    from_bytes(s.as_bytes())
}

/// Decode an XML document from bytes
pub fn from_bytes(bytes: &[u8]) -> Result<Value> {
    decode_with(bytes, Config::default())
}

/// Decode with custom configuration
pub fn from_str_with_config(s: &str, config: Config) -> Result<Value> {
    decode_with(s.as_bytes(), config)
}

fn decode_with(bytes: &[u8], config: Config) -> Result<Value> {
    let mut tokenizer = Tokenizer::new(bytes);
    let mut decoder = Decoder::with_config(config);
    while let Some(event) = tokenizer.next_event()? {
        decoder.push_event(&event)?;
    }
    decoder.finish()
}

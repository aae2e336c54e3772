//! fOS HTML Parser
//!
//! Markup front end for the query engine: builds documents from HTML
//! (html5ever) or XML (quick-xml), imports markup snippets into existing
//! documents and serializes nodes back to markup.

mod content_type;
mod parser;
mod xml;
mod serialize;

pub use content_type::ContentType;
pub use parser::{import_markup, is_markup, parse_document, parse_with_charset};
pub use serialize::{inner_markup, outer_markup};

/// Markup parse or serialization error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed XML: {0}")]
    Xml(String),

    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error(transparent)]
    Dom(#[from] fos_dom::DomError),
}

//! Selector engine
//!
//! - `tokenizer`: selector text to alternatives of tokens
//! - `pseudo`: pseudo-class dispatch shared by both executors
//! - `filter`: per-node refinement of an existing candidate list
//! - `query`: descendant search compiled into path fragments

mod tokenizer;
mod pseudo;
mod filter;
mod query;

pub use tokenizer::{
    tokenize, Alternative, AttributeMatcher, AttributeSelector, Combinator, Scope, Selector, Token,
};
pub use pseudo::PseudoClass;
pub use filter::{filter, is, matches_alternative};
pub use query::find;

pub(crate) use filter::has_classes;
pub(crate) use pseudo::slice_bounds;

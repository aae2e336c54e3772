//! fOS Query - jQuery-style document queries
//!
//! Selector queries, traversal, content and attribute access, mutation
//! and a lightweight style cascade over documents held by a [`Session`].
//!
//! # Example
//!
//! ```no_run
//! use fos_query::Session;
//!
//! let mut session = Session::default();
//! let doc = session.new_document("<ul><li>a</li><li>b</li></ul>", None)?;
//! let items = session.query(doc, "ul > li:last")?.add_class("tail")?;
//! assert_eq!(items.text()?, "b");
//! # Ok::<(), fos_query::QueryError>(())
//! ```

mod config;
mod error;
mod state;
mod session;
mod selection;
mod content;
mod attributes;
mod mutation;
mod style;
mod iter;
pub mod selector;

pub use config::Config;
pub use error::{QueryError, Result};
pub use state::{QueryState, StateArena, StateId};
pub use session::{NodeRef, Session};
pub use selection::Selection;
pub use mutation::Content;
pub use iter::SelectionIter;

pub use fos_dom::{DocumentId, NodeId};

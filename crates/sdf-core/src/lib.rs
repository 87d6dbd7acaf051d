//! # sdf-core
//!
//! Parser, path query engine, schema validator and editor for **SDF
//! (S-expression Data Format)**, a tree data format in the XML/JSON family
//! written as S-expressions.
//!
//! A document is a single node or literal; a node carries a name, named
//! attributes and ordered children:
//!
//! ```text
//! (book {author "Melville" year 1851} [(title "Moby-Dick") (chapters 135)])
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use sdf_core::{find, parse, print};
//!
//! let doc = parse(r#"(book {year 1851} [(title "Moby-Dick")])"#).unwrap();
//!
//! // path queries
//! let hits = find(&doc, "/book/title").unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits.paths(), vec!["/book/title"]);
//!
//! // round-trip through the canonical layout
//! let text = print(&doc);
//! assert_eq!(parse(&text).unwrap(), doc);
//! ```
//!
//! ## Modules
//!
//! - [`parser`] — text → [`Value`] (recursive, whole-document)
//! - [`stream`] — event-by-event parser with validate-while-parsing
//! - [`printer`] — [`Value`] → canonical text
//! - [`matcher`] — path queries over documents ([`find`])
//! - [`schema`] — schema model, full and partial validation
//! - [`json`] — JSON export
//! - [`error`] — [`SdfError`] and [`ValidationError`]
//!
//! Selector-driven edits (`replace`, `remove`, `add_child`, ...) live on
//! [`Value`] itself.

pub mod error;
pub mod json;
pub mod matcher;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod stream;
pub mod value;

mod condition;
mod edit;
mod view;

pub use error::{Result, SdfError, ValidationError};
pub use json::to_json;
pub use matcher::find;
pub use parser::parse;
pub use printer::print;
pub use schema::Schema;
pub use stream::{parse_validated, Event, StreamingParser};
pub use value::{Node, Number, Value, ValueKind};
pub use view::{Match, Matches};

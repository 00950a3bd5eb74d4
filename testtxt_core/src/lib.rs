//! `testtxt_core` turns simple marker-delimited text files into typed test
//! descriptions. A file is a sequence of `=NAME=` markers, each followed by a
//! text block, with reusable templates and find/replace rules applied to the
//! text before it is bound to a field.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Test description file
//!   → Lexer (skips blanks and `#` comments, recognizes `=NAME=` markers, reads text blocks)
//!   → Engine (expands `[[template data]]` calls, then trailing `=SUBST=/from/to/` rules)
//!   → Parser (binds expanded text to schema fields, one record per title marker)
//! ```
//!
//! ## Format
//!
//! ```text
//! # Comments and blank lines are skipped.
//! =TEMPL=greeting
//! Hello {{ data.name }}!
//! =END=
//!
//! =TITLE=first test
//! =INPUT=[[greeting {name: world}]]
//! =SUBST=/world/everyone/
//! =COUNT= 3
//! =TODO=
//! ```
//!
//! Text on the marker line is trimmed and forms the whole block. Otherwise
//! the block spans the following lines up to the next marker, a blank line,
//! or an explicit `=END=`.
//!
//! ## Modules
//!
//! - [`config`]: Loads `testtxt.toml` with the field declarations and the
//!   test file extension.
//! - [`fixture`]: Writes the input files of a test into a directory.
//!
//! ## Key Types
//!
//! - [`Schema`]: The ordered, typed fields a file is parsed into.
//! - [`Record`]: One parsed test description.
//! - [`TestCase`]: A statically typed record, usually declared with
//!   [`test_case!`].
//! - [`TemplateRegistry`]: Templates declared with `=TEMPL=` during one
//!   parse.
//! - [`TestTxtError`]: Every failure, with the file or test it happened in.
//!
//! ## Quick Start
//!
//! ```rust
//! use testtxt_core::Schema;
//! use testtxt_core::parse;
//!
//! let schema = Schema::builder().text("Title").text("Input").build().unwrap();
//! let input = "=TEMPL=input\nnumber 42 wins\n=END=\n=TITLE=t1\n=INPUT=[[input]]\n=SUBST=/wins/WINS/\n";
//! let records = parse(input, "example.t", &schema).unwrap();
//!
//! assert_eq!(records[0].text("Input"), Some("number 42 WINS"));
//! ```

pub use engine::*;
pub use error::*;
pub use parser::*;
pub use schema::*;
pub use templates::*;

pub mod config;
mod engine;
mod error;
pub mod fixture;
pub(crate) mod lexer;
mod parser;
mod schema;
mod templates;
pub(crate) mod tokens;

#[cfg(test)]
mod __fixtures;

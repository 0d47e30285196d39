//! Generates recursive-descent parsers from EBNF grammars.
//!
//! The output is Rust source, as a token stream, implementing
//! `parsegen::Parser` for a type named in the [`Config`]. Each production
//! becomes a `parse_<Name>` routine running against a `parsegen::State`.

mod config;
mod error;
mod generate;

pub use config::Config;
pub use error::{EmitError, Result};
pub use generate::{emit, emit_source, stubs};

//! Runtime support for generated recursive-descent parsers.
//!
//! Generated parse routines drive a [`State`]: literals and lexical hooks
//! advance its cursor, and groups, optionals, and repetitions run against a
//! speculative copy of it that is merged back only on success. Bound
//! variables are rewound instead of copied, see [`Bindings`].

mod bindings;
mod error;
mod position;
mod state;

pub use bindings::Bindings;
pub use error::ParseError;
pub use state::{Fork, State};

/// Result of a lexical hook: the number of bytes consumed and the lexeme.
pub type LexResult = anyhow::Result<(usize, String)>;

/// Implemented by generated parsers.
pub trait Parser {
    /// Semantic state threaded through the parse. Cloned whenever the parser
    /// speculates.
    type State: Clone;
    /// Value produced by the entry production.
    type Output;

    /// Parse the whole input, returning the final semantic state alongside
    /// the result.
    fn parse(input: &str, state: Self::State) -> (Self::State, Result<Self::Output, ParseError>);
}

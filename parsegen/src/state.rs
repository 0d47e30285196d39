use tracing::trace;

use crate::position::Position;
use crate::{Bindings, LexResult, ParseError};

/// Parser state.
///
/// `S` is the user's semantic state. It is handed to actions, error handlers,
/// and lexical hooks, and is cloned every time the parser speculates.
#[derive(Debug, Clone)]
pub struct State<'a, S> {
    cursor: Position<'a>,
    data: S,
    /// The most recent error swallowed by an optional or repetition. Reported
    /// if the parse ends with unconsumed input.
    last_error: Option<ParseError>,
}

/// A speculative state that completed successfully. Merged into its parent
/// with [`State::accept`].
#[derive(Debug)]
pub struct Fork<'a, S> {
    state: State<'a, S>,
}

impl<'a, S> Fork<'a, S> {
    pub fn offset(&self) -> usize {
        self.state.offset()
    }
}

impl<'a, S> State<'a, S> {
    pub fn new(input: &'a str, data: S) -> Self {
        State {
            cursor: Position::new(input),
            data,
            last_error: None,
        }
    }

    /// Parse `input` with the `entry` routine. Succeeds only if the routine
    /// does and nothing but whitespace remains afterwards.
    pub fn run<T, F>(input: &'a str, data: S, entry: F) -> (S, Result<T, ParseError>)
    where
        F: FnOnce(&mut Self) -> Result<T, ParseError>,
    {
        let mut state = State::new(input, data);
        let result = entry(&mut state).and_then(|value| state.finish().map(|()| value));
        (state.into_data(), result)
    }

    /// Byte offset into the input.
    pub fn offset(&self) -> usize {
        self.cursor.idx()
    }

    /// Zero-based line of the current offset.
    pub fn line(&self) -> usize {
        self.cursor.line()
    }

    pub fn rest(&self) -> &'a str {
        self.cursor.rest()
    }

    pub fn data(&self) -> &S {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut S {
        &mut self.data
    }

    pub fn into_data(self) -> S {
        self.data
    }

    pub fn last_error(&self) -> Option<&ParseError> {
        self.last_error.as_ref()
    }

    /// Apply a function to state and bindings, returning the result verbatim.
    pub fn apply<B, F>(&mut self, vars: &mut B, f: F) -> Result<(), ParseError>
    where
        F: FnOnce(&mut Self, &mut B) -> Result<(), ParseError>,
    {
        f(self, vars)
    }

    /// Match a literal after skipping leading whitespace. State is updated
    /// only if the literal matches.
    pub fn literal(&mut self, lit: &'static str) -> Result<&'static str, ParseError> {
        if self.cursor.match_literal(lit) {
            trace!(literal = lit, offset = self.offset(), "matched literal");
            Ok(lit)
        } else {
            Err(ParseError::Expected {
                line: self.line(),
                expected: lit.to_owned(),
            })
        }
    }

    /// Run a lexical hook against the remaining input, advancing past the
    /// bytes it consumed. State is untouched if the hook fails.
    pub fn lex<F>(&mut self, hook: &str, f: F) -> Result<String, ParseError>
    where
        F: FnOnce(&S, &str) -> LexResult,
    {
        let rest = self.rest();
        let (n, lexeme) = match f(&self.data, rest) {
            Ok(lexed) => lexed,
            Err(err) => return Err(self.lex_error(hook, format!("{:#}", err))),
        };
        if !self.cursor.advance(n) {
            return Err(self.lex_error(
                hook,
                format!("consumed {} bytes with {} remaining", n, rest.len()),
            ));
        }
        trace!(hook, lexeme = lexeme.as_str(), offset = self.offset(), "lexed");
        Ok(lexeme)
    }

    fn lex_error(&self, hook: &str, message: String) -> ParseError {
        ParseError::Lex {
            line: self.line(),
            hook: hook.to_owned(),
            message,
        }
    }

    /// Unwrap a binding that must be present once its production matched.
    pub fn bound<T>(&self, value: Option<T>, production: &str) -> Result<T, ParseError> {
        value.ok_or_else(|| ParseError::Unbound {
            line: self.line(),
            production: production.to_owned(),
        })
    }

    /// Discard a failed speculation, remembering why it failed.
    pub fn backtrack(&mut self, err: ParseError) {
        trace!(offset = self.offset(), %err, "backtrack");
        self.last_error = Some(err);
    }

    /// Check that the input has been consumed. If it hasn't, the last
    /// swallowed error usually explains why.
    pub fn finish(&self) -> Result<(), ParseError> {
        if self.cursor.is_exhausted() {
            return Ok(());
        }
        Err(self
            .last_error
            .clone()
            .unwrap_or_else(|| ParseError::TrailingInput { line: self.line() }))
    }
}

impl<'a, S: Clone> State<'a, S> {
    /// A copy of this state to speculate with.
    pub fn predict(&self) -> Self {
        self.clone()
    }

    /// Run `f` against a copy of this state. This state is unchanged until
    /// the returned fork is accepted. Values `f` binds in `vars` are rewound
    /// if it fails.
    pub fn speculate<B, F>(&self, vars: &mut B, f: F) -> Result<Fork<'a, S>, ParseError>
    where
        B: Bindings,
        F: FnOnce(&mut Self, &mut B) -> Result<(), ParseError>,
    {
        trace!(offset = self.offset(), "speculate");
        let mut state = self.predict();
        let mark = vars.mark();
        match f(&mut state, vars) {
            Ok(()) => Ok(Fork { state }),
            Err(err) => {
                vars.rewind(mark);
                Err(err)
            }
        }
    }

    /// Merge a successful fork: position, semantic state, and last error all
    /// come from the fork.
    pub fn accept(&mut self, fork: Fork<'a, S>) {
        trace!(from = self.offset(), to = fork.offset(), "accept");
        let Fork { state } = fork;
        self.cursor = state.cursor;
        self.data = state.data;
        self.last_error = state.last_error;
    }

    /// `( ... )`: speculate, failing if `f` fails.
    pub fn group<B, F>(&mut self, vars: &mut B, f: F) -> Result<(), ParseError>
    where
        B: Bindings,
        F: FnOnce(&mut Self, &mut B) -> Result<(), ParseError>,
    {
        match self.speculate(vars, f) {
            Ok(fork) => {
                self.accept(fork);
                Ok(())
            }
            Err(err) => {
                self.backtrack(err.clone());
                Err(err)
            }
        }
    }

    /// `[ ... ]`: speculate, succeeding whether or not `f` does.
    pub fn optional<B, F>(&mut self, vars: &mut B, f: F) -> Result<(), ParseError>
    where
        B: Bindings,
        F: FnOnce(&mut Self, &mut B) -> Result<(), ParseError>,
    {
        match self.speculate(vars, f) {
            Ok(fork) => self.accept(fork),
            Err(err) => self.backtrack(err),
        }
        Ok(())
    }

    /// `{ ... }`: speculate repeatedly until `f` fails. An iteration that
    /// consumes nothing is kept but ends the loop.
    pub fn repeat<B, F>(&mut self, vars: &mut B, f: F) -> Result<(), ParseError>
    where
        B: Bindings,
        F: Fn(&mut Self, &mut B) -> Result<(), ParseError>,
    {
        loop {
            let start = self.offset();
            match self.speculate(vars, &f) {
                Ok(fork) => {
                    let progressed = fork.offset() > start;
                    self.accept(fork);
                    if !progressed {
                        return Ok(());
                    }
                }
                Err(err) => {
                    self.backtrack(err);
                    return Ok(());
                }
            }
        }
    }
}

//! A small calculator built on a derived parser.
//!
//! ```text
//! let x = 4;
//! x * (x - 1);
//! ```
//!
//! Statements are evaluated while parsing. See `calc.ebnf` for the grammar.

use std::collections::HashMap;

use anyhow::{bail, Context};
use derive::Parser;
use parsegen::{LexResult, ParseError, Parser as _};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("undefined variable: {0}")]
    Undefined(String),
}

/// Semantic state of the calculator.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, i64>,
    output: Vec<i64>,
    undefined: Vec<String>,
}

impl Env {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.vars.get(name).copied()
    }

    pub fn output(&self) -> &[i64] {
        &self.output
    }

    /// Look up a variable. Undefined variables evaluate to zero and are
    /// remembered so evaluation can fail once parsing is done.
    fn lookup(&mut self, name: &str) -> i64 {
        match self.vars.get(name) {
            Some(v) => *v,
            None => {
                self.undefined.push(name.to_owned());
                0
            }
        }
    }
}

fn split_whitespace(input: &str) -> (usize, &str) {
    let rest = input.trim_start();
    (input.len() - rest.len(), rest)
}

impl CalcLexer for Env {
    fn lex_number(&self, input: &str) -> LexResult {
        let (skipped, rest) = split_whitespace(input);
        let len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if len == 0 {
            bail!("expected a number");
        }
        let digits = &rest[..len];
        digits
            .parse::<i64>()
            .with_context(|| format!("number {} out of range", digits))?;
        Ok((skipped + len, digits.to_owned()))
    }

    fn lex_ident(&self, input: &str) -> LexResult {
        let (skipped, rest) = split_whitespace(input);
        if !rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            bail!("expected an identifier");
        }
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let ident = &rest[..len];
        if ident == "let" {
            bail!("{} is a keyword", ident);
        }
        Ok((skipped + len, ident.to_owned()))
    }
}

#[derive(Parser)]
#[ebnf_file = "calc.ebnf"]
#[ebnf_state = "Env"]
pub struct Calc;

/// Evaluate a program, returning the values of its expression statements.
pub fn evaluate(source: &str) -> Result<Vec<i64>, CalcError> {
    let (env, res) = Calc::parse(source, Env::default());
    res?;
    if let Some(name) = env.undefined.into_iter().next() {
        return Err(CalcError::Undefined(name));
    }
    debug!(values = env.output.len(), "evaluated program");
    Ok(env.output)
}

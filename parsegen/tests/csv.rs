//! A very simple csv parser that acts only on numbers, written by hand the
//! way generated parsers drive the runtime.
//!
//! csv    = { record } ;
//! record = field { "," field } lex(newline) ;
//! field  = lex(digits) ;

use anyhow::{anyhow, bail};
use parsegen::{Bindings, LexResult, ParseError, Parser, State};
use pretty_assertions::assert_eq;

/// Records parsed so far.
#[derive(Debug, Clone, Default, PartialEq)]
struct Table {
    rows: Vec<Vec<u64>>,
}

fn digits(_: &Table, input: &str) -> LexResult {
    let len = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    if len == 0 {
        bail!("expected digits");
    }
    Ok((len, input[..len].to_owned()))
}

fn newline(_: &Table, input: &str) -> LexResult {
    let trimmed = input.trim_start_matches(|c: char| c == ' ' || c == '\t');
    if trimmed.starts_with('\n') {
        Ok((input.len() - trimmed.len() + 1, "\n".to_owned()))
    } else {
        Err(anyhow!("expected end of record"))
    }
}

fn field(p: &mut State<'_, Table>) -> Result<u64, ParseError> {
    let line = p.line();
    let text = p.lex("digits", digits)?;
    text.parse()
        .map_err(|e| ParseError::custom(line, format!("{}: {}", text, e)))
}

#[derive(Debug, Default)]
struct RecordVars {
    first: Option<u64>,
    rest: Vec<u64>,
}

impl Bindings for RecordVars {
    type Mark = (Option<u64>, usize);

    fn mark(&self) -> Self::Mark {
        (self.first.mark(), self.rest.mark())
    }

    fn rewind(&mut self, (first, rest): Self::Mark) {
        self.first.rewind(first);
        self.rest.rewind(rest);
    }
}

fn record(p: &mut State<'_, Table>) -> Result<(), ParseError> {
    let mut vars = RecordVars::default();
    p.apply(&mut vars, |p, vars| {
        vars.first = Some(field(p)?);
        p.repeat(vars, |p, vars| {
            p.literal(",")?;
            vars.rest.push(field(p)?);
            Ok(())
        })?;
        p.lex("newline", newline)?;
        Ok(())
    })?;

    let mut row = vec![p.bound(vars.first, "record")?];
    row.extend(vars.rest);
    p.data_mut().rows.push(row);
    Ok(())
}

fn csv(p: &mut State<'_, Table>) -> Result<(), ParseError> {
    p.repeat(&mut (), |p, _| record(p))
}

struct CsvParser;

impl Parser for CsvParser {
    type State = Table;
    type Output = ();

    fn parse(input: &str, state: Table) -> (Table, Result<(), ParseError>) {
        State::run(input, state, csv)
    }
}

#[test]
fn records() {
    let (table, res) = CsvParser::parse("184,754\n33,22222\n", Table::default());

    assert_eq!(res, Ok(()));
    assert_eq!(table.rows, vec![vec![184, 754], vec![33, 22222]]);
}

#[test]
fn empty() {
    let (table, res) = CsvParser::parse("", Table::default());

    assert_eq!(res, Ok(()));
    assert!(table.rows.is_empty());
}

#[test]
fn trailing_comma() {
    let (table, res) = CsvParser::parse("12,\n", Table::default());

    assert_eq!(
        res,
        Err(ParseError::Lex {
            line: 0,
            hook: "newline".to_owned(),
            message: "expected end of record".to_owned(),
        })
    );
    assert!(table.rows.is_empty());
}

#[test]
fn failed_record_is_discarded() {
    let (table, res) = CsvParser::parse("1\n2,3", Table::default());

    assert_eq!(res.unwrap_err().line(), 1);
    assert_eq!(table.rows, vec![vec![1]]);
}

#[test]
fn number_too_large() {
    let (_, res) = CsvParser::parse("99999999999999999999\n", Table::default());

    match res {
        Err(ParseError::Custom { line: 0, message }) => {
            assert!(message.starts_with("99999999999999999999: "), "{}", message)
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

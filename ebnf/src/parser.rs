use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, multispace1},
    combinator::{all_consuming, map, opt, recognize, value, verify},
    error::{Error, ErrorKind},
    multi::{many0, many1},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use tracing::debug;

use crate::{Alternative, Expression, Gor, Grammar, GrammarError, Identifier, Production, Term, Terminal};

type Res<'a, T> = IResult<&'a str, T>;

fn fail<T>(input: &str, code: ErrorKind) -> Res<'_, T> {
    Err(nom::Err::Error(Error { input, code }))
}

/// A `#` comment running to the end of the line.
fn comment(input: &str) -> Res<&str> {
    recognize(pair(char('#'), take_while(|c: char| c != '\n')))(input)
}

/// Skip whitespace and comments.
fn sp(input: &str) -> Res<()> {
    value((), many0(alt((multispace1, comment))))(input)
}

fn ws<'a, O, F>(f: F) -> impl FnMut(&'a str) -> Res<'a, O>
where
    F: FnMut(&'a str) -> Res<'a, O>,
{
    preceded(sp, f)
}

/// Run a parser that must consume all input, save trailing whitespace.
pub(crate) fn complete<'a, O, F>(f: F) -> impl FnMut(&'a str) -> Res<'a, O>
where
    F: FnMut(&'a str) -> Res<'a, O>,
{
    all_consuming(terminated(f, sp))
}

pub fn identifier(input: &str) -> Res<Identifier> {
    let (rem, matched) = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)?;
    Ok((rem, Identifier(matched.to_owned())))
}

/// An identifier usable as a production name. `lex` introduces a lexical
/// hook and is reserved.
fn production_name(input: &str) -> Res<Identifier> {
    verify(identifier, |id: &Identifier| id.as_str() != "lex")(input)
}

/// A single or double quoted literal with backslash escapes.
pub fn terminal(input: &str) -> Res<Terminal> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, c)) if c == '"' || c == '\'' => c,
        _ => return fail(input, ErrorKind::Char),
    };

    let mut out = String::new();
    let mut escape = false;
    for (i, c) in chars {
        if escape {
            out.push(match c {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
            escape = false;
            continue;
        }
        match c {
            '\\' => escape = true,
            c if c == quote => return Ok((&input[i + c.len_utf8()..], Terminal(out))),
            c => out.push(c),
        }
    }
    fail(input, ErrorKind::Char)
}

fn lex_hook(input: &str) -> Res<Term> {
    let (rem, _) = tag("lex")(input)?;
    let (rem, name) = delimited(ws(char('(')), ws(identifier), ws(char(')')))(rem)?;
    Ok((rem, Term::Lex(name)))
}

fn gor(input: &str) -> Res<Gor> {
    alt((
        map(delimited(char('('), expression, ws(char(')'))), Gor::Group),
        map(delimited(char('['), expression, ws(char(']'))), Gor::Optional),
        map(delimited(char('{'), expression, ws(char('}'))), Gor::Repeat),
    ))(input)
}

fn term(input: &str) -> Res<Term> {
    alt((
        lex_hook,
        map(production_name, Term::Production),
        map(terminal, Term::Literal),
        map(gor, Term::Sub),
    ))(input)
}

fn alternative(input: &str) -> Res<Alternative> {
    map(many1(ws(term)), |terms| Alternative { terms })(input)
}

pub(crate) fn expression(input: &str) -> Res<Expression> {
    let (rem, first) = alternative(input)?;
    let (rem, rest) = many0(preceded(ws(char('|')), alternative))(rem)?;
    let mut alternatives = vec![first];
    alternatives.extend(rest);
    Ok((rem, Expression { alternatives }))
}

/// `: Type`, the text up to the `=` sign.
fn annotation(input: &str) -> Res<String> {
    let (rem, text) = preceded(ws(char(':')), is_not("="))(input)?;
    let ty = text.trim();
    if ty.is_empty() {
        return fail(input, ErrorKind::IsNot);
    }
    Ok((rem, ty.to_owned()))
}

/// Length of the character literal at the start of `s`, if there is one. A
/// lifetime like `'a` has no closing quote and isn't a literal.
fn char_literal(s: &str) -> Option<usize> {
    let mut chars = s.char_indices().skip(1);
    match chars.next()? {
        (_, '\\') => {
            chars.next()?;
            chars.find(|&(_, c)| c == '\'').map(|(i, _)| i + 1)
        }
        (_, '\'') => None,
        _ => match chars.next()? {
            (i, '\'') => Some(i + 1),
            _ => None,
        },
    }
}

/// The body of a `{ ... }` code block. Braces inside string and character
/// literals and escaped characters don't count towards nesting.
fn code(input: &str) -> Res<String> {
    let (body, _) = char('{')(input)?;

    let mut depth = 0usize;
    let mut quote = false;
    let mut escape = false;
    let mut skip = 0;
    for (i, c) in body.char_indices() {
        if i < skip {
            continue;
        }
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' => escape = true,
            '"' => quote = !quote,
            _ if quote => (),
            '\'' => {
                if let Some(len) = char_literal(&body[i..]) {
                    skip = i + len;
                }
            }
            '{' => depth += 1,
            '}' if depth == 0 => return Ok((&body[i + 1..], body[..i].trim().to_owned())),
            '}' => depth -= 1,
            _ => (),
        }
    }
    Err(nom::Err::Failure(Error {
        input,
        code: ErrorKind::TakeUntil,
    }))
}

fn block<'a>(keyword: &'static str) -> impl FnMut(&'a str) -> Res<'a, String> {
    preceded(pair(ws(tag(keyword)), sp), code)
}

pub(crate) fn production(input: &str) -> Res<Production> {
    let (rem, name) = ws(production_name)(input)?;
    let (rem, ty) = opt(annotation)(rem)?;
    let (rem, _) = ws(char('='))(rem)?;
    let (rem, expression) = expression(rem)?;
    let (rem, _) = ws(char(';'))(rem)?;
    let (rem, action) = opt(block("action"))(rem)?;
    let (rem, error) = opt(block("error"))(rem)?;
    Ok((
        rem,
        Production {
            name,
            ty,
            expression,
            action,
            error,
        },
    ))
}

/// Parse a full grammar, adding productions one at a time so that errors can
/// name the production they occurred in.
pub(crate) fn grammar(input: &str) -> Result<Grammar, GrammarError> {
    let mut grammar = Grammar::new();
    let mut rem = input;
    loop {
        let (next, _) = sp(rem)?;
        if next.is_empty() {
            break;
        }
        let (next, rule) = production(next).map_err(|err| {
            let name = identifier(next).ok().map(|(_, id)| id.0);
            let near = match &err {
                nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
                nom::Err::Incomplete(_) => next,
            };
            GrammarError::syntax(name, near)
        })?;
        grammar.add(rule)?;
        rem = next;
    }
    debug!(productions = grammar.productions().len(), "parsed grammar");
    Ok(grammar)
}

//! Grammar model for EBNF-like grammar descriptions.
//!
//! A grammar is a list of productions. Each production has an expression
//! made of ordered alternatives, each of which is a sequence of terms. Terms
//! may nest groups `( )`, optionals `[ ]`, and repetitions `{ }`.
//!
//! Grammars can be built programmatically with [`Grammar::add`], or parsed
//! from text via `FromStr`. Every node renders back to the surface form with
//! `Display`.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display};
use std::str::FromStr;

pub mod bind;
mod error;
mod parser;
pub mod types;
mod validate;

pub use bind::{Binding, VarKind, Variable};
pub use error::{GrammarError, Result};
pub use types::TypeRegistry;
pub use validate::verify;

/// A constant identifying production rules.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A literal string.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Terminal(pub String);

impl Terminal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.0.chars() {
            match c {
                '\\' => write!(f, "\\\\")?,
                '"' => write!(f, "\\\"")?,
                '\n' => write!(f, "\\n")?,
                '\t' => write!(f, "\\t")?,
                '\r' => write!(f, "\\r")?,
                c => write!(f, "{}", c)?,
            }
        }
        write!(f, "\"")
    }
}

impl From<&str> for Terminal {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A single element of an alternative.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Term {
    /// Reference to another production.
    Production(Identifier),
    /// Literal text, matched after skipping leading whitespace.
    Literal(Terminal),
    /// Externally implemented scanner, written `lex(name)`.
    Lex(Identifier),
    /// A nested group, optional, or repetition.
    Sub(Gor),
}

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Production(iden) => write!(f, "{}", iden),
            Term::Literal(term) => write!(f, "{}", term),
            Term::Lex(iden) => write!(f, "lex({})", iden),
            Term::Sub(gor) => write!(f, "{}", gor),
        }
    }
}

/// A group, optional, or repetition wrapping a nested expression.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Gor {
    Group(Expression),
    Optional(Expression),
    Repeat(Expression),
}

impl Gor {
    pub fn expression(&self) -> &Expression {
        match self {
            Gor::Group(expr) | Gor::Optional(expr) | Gor::Repeat(expr) => expr,
        }
    }
}

impl Display for Gor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Gor::Group(expr) => write!(f, "( {} )", expr),
            Gor::Optional(expr) => write!(f, "[ {} ]", expr),
            Gor::Repeat(expr) => write!(f, "{{ {} }}", expr),
        }
    }
}

/// A sequence of terms. All terms must match, in order.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Alternative {
    pub terms: Vec<Term>,
}

impl From<Vec<Term>> for Alternative {
    fn from(terms: Vec<Term>) -> Self {
        Alternative { terms }
    }
}

impl Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}

/// An ordered choice between alternatives. Earlier alternatives win.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Expression {
    pub alternatives: Vec<Alternative>,
}

impl Expression {
    pub fn new(alternatives: Vec<Alternative>) -> Self {
        Expression { alternatives }
    }

    /// An expression with a single alternative.
    pub fn sequence(terms: Vec<Term>) -> Self {
        Expression {
            alternatives: vec![terms.into()],
        }
    }

    /// All production names referenced by the expression, including those
    /// nested in groups, optionals, and repetitions. Names appear in textual
    /// order and may repeat.
    pub fn names(&self) -> Vec<&Identifier> {
        let mut names = Vec::new();
        self.walk(&mut |term| {
            if let Term::Production(name) = term {
                names.push(name);
            }
        });
        names
    }

    /// Names of all lexical hooks used by the expression.
    pub fn lex_hooks(&self) -> BTreeSet<&str> {
        let mut hooks = BTreeSet::new();
        self.walk(&mut |term| {
            if let Term::Lex(name) = term {
                hooks.insert(name.as_str());
            }
        });
        hooks
    }

    /// Visit every term in pre-order.
    fn walk<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Term),
    {
        for alt in &self.alternatives {
            for term in &alt.terms {
                f(term);
                if let Term::Sub(gor) = term {
                    gor.expression().walk(f);
                }
            }
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, alt) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", alt)?;
        }
        Ok(())
    }
}

impl FromStr for Expression {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self> {
        let (_, expr) = parser::complete(parser::expression)(s)?;
        Ok(expr)
    }
}

/// A production rule.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Production {
    pub name: Identifier,
    /// Declared semantic type, as Rust type text.
    pub ty: Option<String>,
    pub expression: Expression,
    /// Code run when the production matches.
    pub action: Option<String>,
    /// Code run when the production fails. Must evaluate to an error.
    pub error: Option<String>,
}

impl Production {
    pub fn new(name: &str, expression: Expression) -> Self {
        Production {
            name: name.into(),
            ty: None,
            expression,
            action: None,
            error: None,
        }
    }

    pub fn with_type(mut self, ty: &str) -> Self {
        self.ty = Some(ty.to_owned());
        self
    }

    pub fn with_action(mut self, code: &str) -> Self {
        self.action = Some(code.to_owned());
        self
    }

    pub fn with_error(mut self, code: &str) -> Self {
        self.error = Some(code.to_owned());
        self
    }

    /// Whether the production has an action or an error handler, in which
    /// case literals and lexemes get bound for it.
    pub fn has_handlers(&self) -> bool {
        self.action.is_some() || self.error.is_some()
    }

    /// The `name = expression ;` part, without type or code blocks.
    pub fn rule(&self) -> String {
        format!("{} = {} ;", self.name, self.expression)
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(ty) = &self.ty {
            write!(f, " : {}", ty)?;
        }
        write!(f, " = {} ;", self.expression)?;
        if let Some(code) = &self.action {
            write!(f, " action {{ {} }}", code)?;
        }
        if let Some(code) = &self.error {
            write!(f, " error {{ {} }}", code)?;
        }
        Ok(())
    }
}

impl FromStr for Production {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self> {
        let (_, production) = parser::complete(parser::production)(s)?;
        Ok(production)
    }
}

/// A set of rules. The first production added is the entry point.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Grammar {
    productions: Vec<Production>,
    index: HashMap<String, usize>,
    referenced: Vec<Identifier>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a production, checking that it is well formed and that its name
    /// is not already taken.
    pub fn add(&mut self, production: Production) -> Result<()> {
        let name = production.name.as_str();
        if self.index.contains_key(name) {
            return Err(GrammarError::DuplicateProduction(name.to_owned()));
        }
        check_expression(name, &production.expression)?;

        for referenced in production.expression.names() {
            if !self.referenced.contains(referenced) {
                self.referenced.push(referenced.clone());
            }
        }
        self.index.insert(name.to_owned(), self.productions.len());
        self.productions.push(production);
        Ok(())
    }

    /// Name of the first declared production.
    pub fn entry(&self) -> Option<&Identifier> {
        self.productions.first().map(|p| &p.name)
    }

    pub fn get(&self, name: &str) -> Option<&Production> {
        self.index.get(name).map(|&i| &self.productions[i])
    }

    /// Productions in declaration order.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Every production name referenced by any expression, in order of first
    /// reference.
    pub fn referenced(&self) -> &[Identifier] {
        &self.referenced
    }

    /// Sorted names of all lexical hooks used anywhere in the grammar.
    pub fn lex_hooks(&self) -> BTreeSet<&str> {
        self.productions
            .iter()
            .flat_map(|p| p.expression.lex_hooks())
            .collect()
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rule in &self.productions {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl FromStr for Grammar {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self> {
        parser::grammar(s)
    }
}

fn check_expression(production: &str, expr: &Expression) -> Result<()> {
    if expr.alternatives.is_empty() {
        return Err(GrammarError::EmptyExpression(production.to_owned()));
    }
    for alt in &expr.alternatives {
        if alt.terms.is_empty() {
            return Err(GrammarError::EmptyAlternative(production.to_owned()));
        }
        for term in &alt.terms {
            match term {
                Term::Literal(lit) if lit.0.trim() != lit.0 => {
                    return Err(GrammarError::InvalidLiteral {
                        production: production.to_owned(),
                        literal: lit.0.clone(),
                    });
                }
                Term::Sub(gor) => check_expression(production, gor.expression())?,
                _ => (),
            }
        }
    }
    Ok(())
}

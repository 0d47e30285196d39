//! Positional variable binding.
//!
//! Every term of a production that yields a value gets a variable. Variables
//! are numbered in pre-order over the production's terms, descending into
//! groups, optionals, and repetitions in place. When the production has an
//! action, each alternation point also gets an index variable recording which
//! alternative matched; these come ahead of all other variables.
//!
//! ```text
//! Sum : i64 = Product { ( "+" | "-" ) Product } ; action { ... }
//!
//! v0: Vec<usize>          index of ( "+" | "-" )
//! v1: i64                 Product
//! v2: Vec<&'static str>   "+"
//! v3: Vec<&'static str>   "-"
//! v4: Vec<i64>            Product
//! ```

use tracing::trace;

use crate::{Expression, Gor, Identifier, Production, Term, Terminal, TypeRegistry};

/// What a variable is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarKind {
    /// Zero-based index of the alternative that matched.
    Index,
    Production(Identifier),
    Literal(Terminal),
    Lex(Identifier),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub kind: VarKind,
    /// Rust type of a single value.
    pub ty: String,
    /// Bound inside a repetition, one value per iteration.
    pub repeated: bool,
    /// May be absent even when the production matches.
    pub conditional: bool,
}

impl Variable {
    fn new(kind: VarKind, ty: &str, scope: Scope) -> Self {
        Variable {
            kind,
            ty: ty.to_owned(),
            repeated: scope.repeated,
            conditional: scope.conditional,
        }
    }

    /// Type of the slot holding the variable while the production is being
    /// parsed.
    pub fn storage_type(&self) -> String {
        if self.repeated {
            format!("Vec<{}>", self.ty)
        } else {
            format!("Option<{}>", self.ty)
        }
    }

    /// Type handed to the action once the production matched.
    pub fn value_type(&self) -> String {
        if self.repeated {
            format!("Vec<{}>", self.ty)
        } else if self.conditional {
            format!("Option<{}>", self.ty)
        } else {
            self.ty.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    repeated: bool,
    conditional: bool,
}

/// Variables of one production, plus where each term and alternation point
/// stores its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    variables: Vec<Variable>,
    terms: Vec<Option<usize>>,
    choices: Vec<Option<usize>>,
}

impl Binding {
    pub fn of(production: &Production, types: &TypeRegistry) -> Binding {
        let mut walker = Walker {
            types,
            bind_tokens: production.has_handlers(),
            with_index: production.action.is_some(),
            indexes: Vec::new(),
            values: Vec::new(),
            terms: Vec::new(),
            choices: Vec::new(),
        };
        walker.expression(&production.expression, Scope::default());

        let offset = walker.indexes.len();
        let terms = walker
            .terms
            .into_iter()
            .map(|slot| slot.map(|i| i + offset))
            .collect();
        let mut variables = walker.indexes;
        variables.extend(walker.values);

        trace!(production = production.name.as_str(), variables = variables.len(), "bound");
        Binding {
            variables,
            terms,
            choices: walker.choices,
        }
    }

    /// Variables in binding order. Variable `i` is named `v{i}`.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Variable bound by the `ordinal`th term in pre-order, if any.
    pub fn term_slot(&self, ordinal: usize) -> Option<usize> {
        self.terms.get(ordinal).copied().flatten()
    }

    /// Index variable of the `ordinal`th alternation point in pre-order, if
    /// any.
    pub fn choice_slot(&self, ordinal: usize) -> Option<usize> {
        self.choices.get(ordinal).copied().flatten()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn choice_count(&self) -> usize {
        self.choices.len()
    }
}

struct Walker<'a> {
    types: &'a TypeRegistry,
    bind_tokens: bool,
    with_index: bool,
    indexes: Vec<Variable>,
    values: Vec<Variable>,
    terms: Vec<Option<usize>>,
    choices: Vec<Option<usize>>,
}

impl<'a> Walker<'a> {
    fn expression(&mut self, expr: &Expression, scope: Scope) {
        let multi = expr.alternatives.len() > 1;
        if multi {
            let slot = if self.with_index {
                self.indexes
                    .push(Variable::new(VarKind::Index, "usize", scope));
                Some(self.indexes.len() - 1)
            } else {
                None
            };
            self.choices.push(slot);
        }

        let inner = Scope {
            conditional: scope.conditional || multi,
            ..scope
        };
        for alt in &expr.alternatives {
            for term in &alt.terms {
                self.term(term, inner);
            }
        }
    }

    fn term(&mut self, term: &Term, scope: Scope) {
        let bound = match term {
            Term::Production(name) => self
                .types
                .get(name.as_str())
                .map(|ty| Variable::new(VarKind::Production(name.clone()), ty, scope)),
            Term::Literal(lit) if self.bind_tokens => Some(Variable::new(
                VarKind::Literal(lit.clone()),
                "&'static str",
                scope,
            )),
            Term::Lex(name) if self.bind_tokens => {
                Some(Variable::new(VarKind::Lex(name.clone()), "String", scope))
            }
            Term::Literal(_) | Term::Lex(_) => None,
            Term::Sub(gor) => {
                self.terms.push(None);
                let inner = match gor {
                    Gor::Group(_) => scope,
                    Gor::Optional(_) => Scope {
                        conditional: true,
                        ..scope
                    },
                    Gor::Repeat(_) => Scope {
                        repeated: true,
                        ..scope
                    },
                };
                self.expression(gor.expression(), inner);
                return;
            }
        };

        match bound {
            Some(var) => {
                self.values.push(var);
                self.terms.push(Some(self.values.len() - 1));
            }
            None => self.terms.push(None),
        }
    }
}

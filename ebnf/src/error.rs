use thiserror::Error;

pub type Result<T> = std::result::Result<T, GrammarError>;

/// Errors raised while building or verifying a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("failed to parse {}: near {near:?}", .production.as_deref().unwrap_or("grammar"))]
    Syntax {
        /// The production being parsed, if its name was read.
        production: Option<String>,
        near: String,
    },
    #[error("production {0} redeclared")]
    DuplicateProduction(String),
    #[error("production {0} has an empty expression")]
    EmptyExpression(String),
    #[error("production {0} has an empty alternative")]
    EmptyAlternative(String),
    #[error("literal {literal:?} in production {production} has leading or trailing whitespace")]
    InvalidLiteral { production: String, literal: String },
    #[error("grammar has no productions")]
    MissingEntryPoint,
    #[error("production {0} not defined")]
    UndefinedProduction(String),
    #[error("production {0} defined but not used")]
    UnusedProduction(String),
}

/// Length of the input excerpt carried by syntax errors.
const NEAR_LEN: usize = 24;

impl GrammarError {
    pub(crate) fn syntax(production: Option<String>, remaining: &str) -> GrammarError {
        GrammarError::Syntax {
            production,
            near: remaining.chars().take(NEAR_LEN).collect(),
        }
    }
}

impl From<nom::Err<nom::error::Error<&str>>> for GrammarError {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> GrammarError {
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => GrammarError::syntax(None, e.input),
            nom::Err::Incomplete(_) => GrammarError::syntax(None, ""),
        }
    }
}

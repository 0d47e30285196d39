use ebnf::GrammarError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmitError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error("{name:?} is not a valid identifier")]
    InvalidName { name: String },
    #[error("type {ty:?} in production {production} is not a valid type")]
    InvalidType { production: String, ty: String },
    #[error("{kind} block of production {production} is malformed: {message}")]
    MalformedCode {
        production: String,
        kind: &'static str,
        message: String,
    },
    #[error("production {production}: {message}")]
    Inconsistent { production: String, message: String },
}

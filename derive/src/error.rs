use codegen::EmitError;
use ebnf::GrammarError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeriveError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeriveError {
    #[error("no grammar source provided, expected #[ebnf_inline = \"...\"] or #[ebnf_file = \"...\"]")]
    MissingGrammarSource,
    #[error("at most one grammar source can be provided")]
    MultipleGrammarSources,
    #[error("read ebnf file {path}: {message}")]
    ReadGrammar { path: String, message: String },
    #[error("invalid attribute: {0}")]
    Attribute(String),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl From<syn::Error> for DeriveError {
    fn from(e: syn::Error) -> DeriveError {
        DeriveError::Attribute(e.to_string())
    }
}

//! Proc macros for deriving parsers from EBNF grammars.
//!
//! ```ignore
//! use derive::Parser;
//!
//! #[derive(Parser)]
//! #[ebnf_file = "calc.ebnf"]
//! #[ebnf_state = "Env"]
//! pub struct Calc;
//! ```
//!
//! The grammar is verified before any code is generated. Errors are reported
//! at the deriving type.

use std::env;
use std::fs;
use std::path::Path;

use codegen::Config;
use ebnf::{Grammar, TypeRegistry};
use proc_macro2::TokenStream;
use syn::{parse_macro_input, Attribute, DeriveInput, Lit, Meta, Type};

mod error;
use error::{DeriveError, Result};

const EBNF_FILE_ATTR: &str = "ebnf_file";
const EBNF_INLINE_ATTR: &str = "ebnf_inline";
const EBNF_STATE_ATTR: &str = "ebnf_state";
const EBNF_STUBS_ATTR: &str = "ebnf_stubs";

#[proc_macro_derive(Parser, attributes(ebnf_file, ebnf_inline, ebnf_state, ebnf_stubs))]
pub fn derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    match generate(&ast) {
        Ok(tokens) => tokens.into(),
        Err(err) => syn::Error::new_spanned(&ast.ident, err)
            .to_compile_error()
            .into(),
    }
}

fn generate(ast: &DeriveInput) -> Result<TokenStream> {
    let grammar = grammar_from_ast(ast)?;
    let config = config_from_ast(ast)?;
    ebnf::verify(&grammar)?;
    let types = TypeRegistry::from(&grammar);
    Ok(codegen::emit(&grammar, &types, &config)?)
}

/// Load a grammar from a derive attribute.
///
/// There must be exactly 1 attribute specifying the grammar source. The source
/// may either be written inline, or a path to an ebnf file relative to the
/// crate root.
fn grammar_from_ast(ast: &DeriveInput) -> Result<Grammar> {
    let sources: Vec<&Attribute> = ast
        .attrs
        .iter()
        .filter(|attr| attr.path.is_ident(EBNF_FILE_ATTR) || attr.path.is_ident(EBNF_INLINE_ATTR))
        .collect();

    let source_attr = match sources.len() {
        0 => return Err(DeriveError::MissingGrammarSource),
        1 => sources[0],
        _ => return Err(DeriveError::MultipleGrammarSources),
    };

    let value = string_attr(source_attr)?;
    if source_attr.path.is_ident(EBNF_FILE_ATTR) {
        let root = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into());
        let path = Path::new(&root).join(&value);
        let data = fs::read_to_string(&path).map_err(|e| DeriveError::ReadGrammar {
            path: path.to_string_lossy().into_owned(),
            message: e.to_string(),
        })?;
        Ok(data.parse()?)
    } else {
        Ok(value.parse()?)
    }
}

fn config_from_ast(ast: &DeriveInput) -> Result<Config> {
    let mut config = Config::new(ast.ident.clone()).with_generics(ast.generics.clone());
    for attr in &ast.attrs {
        if attr.path.is_ident(EBNF_STATE_ATTR) {
            let text = string_attr(attr)?;
            let state: Type = syn::parse_str(&text)
                .map_err(|e| DeriveError::Attribute(format!("{:?} is not a type: {}", text, e)))?;
            config = config.with_state(state);
        } else if attr.path.is_ident(EBNF_STUBS_ATTR) {
            match attr.parse_meta()? {
                Meta::Path(_) => config = config.with_stubs(true),
                _ => {
                    return Err(DeriveError::Attribute(format!(
                        "expected #[{}] without arguments",
                        EBNF_STUBS_ATTR
                    )))
                }
            }
        }
    }
    Ok(config)
}

/// The string value of a `#[name = "value"]` attribute.
fn string_attr(attr: &Attribute) -> Result<String> {
    match attr.parse_meta()? {
        Meta::NameValue(val) => match val.lit {
            Lit::Str(s) => Ok(s.value()),
            _ => Err(DeriveError::Attribute("attribute not a string".to_owned())),
        },
        _ => Err(DeriveError::Attribute("attribute not a name value".to_owned())),
    }
}

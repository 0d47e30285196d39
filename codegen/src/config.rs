use proc_macro2::Ident;
use quote::format_ident;
use syn::{parse_quote, Generics, Type};

/// Options for generating a parser.
#[derive(Clone)]
pub struct Config {
    /// The type `parsegen::Parser` is implemented for.
    pub name: Ident,
    pub generics: Generics,
    /// Semantic state threaded through the parser. Defaults to `()`.
    pub state: Type,
    /// Emit an implementation of the lexer trait with placeholder hooks.
    pub stubs: bool,
}

impl Config {
    pub fn new(name: Ident) -> Self {
        Config {
            name,
            generics: Generics::default(),
            state: parse_quote!(()),
            stubs: false,
        }
    }

    pub fn with_generics(mut self, generics: Generics) -> Self {
        self.generics = generics;
        self
    }

    pub fn with_state(mut self, state: Type) -> Self {
        self.state = state;
        self
    }

    pub fn with_stubs(mut self, stubs: bool) -> Self {
        self.stubs = stubs;
        self
    }

    /// Name of the trait the semantic state implements to provide lexical
    /// hooks.
    pub fn lexer_trait(&self) -> Ident {
        format_ident!("{}Lexer", self.name)
    }
}

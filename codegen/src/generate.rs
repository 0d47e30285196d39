use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};
use syn::Type;
use tracing::debug;

use ebnf::{Alternative, Binding, Expression, Gor, Grammar, GrammarError, Production, Term, TypeRegistry};

use crate::config::Config;
use crate::error::{EmitError, Result};

/// Generate a parser for a verified grammar.
///
/// The output contains the lexer trait (if the grammar uses lexical hooks),
/// hook stubs if requested, and the `parsegen::Parser` implementation.
/// Individual production routines are generated in a nested `productions`
/// module to prevent name clashes.
pub fn emit(grammar: &Grammar, types: &TypeRegistry, config: &Config) -> Result<TokenStream> {
    let entry = grammar.entry().ok_or(GrammarError::MissingEntryPoint)?;
    let name = &config.name;
    let state = &config.state;
    let (impl_generics, ty_generics, where_clause) = config.generics.split_for_impl();

    let lexer = generate_lexer_trait(grammar, config)?;
    let stubs = if config.stubs {
        stubs(grammar, config)?
    } else {
        TokenStream::new()
    };

    let routines = grammar
        .productions()
        .iter()
        .map(|production| ProductionEmitter::new(production, types, config).emit())
        .collect::<Result<Vec<_>>>()?;
    let entry_routine = routine_ident(entry.as_str())?;
    let output = return_type(entry.as_str(), types)?;

    debug!(parser = %name, productions = routines.len(), "emitted parser");
    Ok(quote! {
        #lexer
        #stubs

        impl #impl_generics ::parsegen::Parser for #name #ty_generics #where_clause {
            type State = #state;
            type Output = #output;

            fn parse(input: &str, state: #state) -> (#state, ::core::result::Result<#output, ::parsegen::ParseError>) {
                #[allow(non_snake_case, dead_code, unused_imports, unused_mut, unused_variables, clippy::all)]
                mod productions {
                    use super::*;
                    use ::parsegen::ParseError;

                    #( #routines )*
                }

                ::parsegen::State::run(input, state, productions::#entry_routine)
            }
        }
    })
}

/// Same as [`emit`], rendered as source text.
pub fn emit_source(grammar: &Grammar, types: &TypeRegistry, config: &Config) -> Result<String> {
    emit(grammar, types, config).map(|tokens| tokens.to_string())
}

/// Generate an implementation of the lexer trait for the semantic state where
/// every hook matches nothing.
pub fn stubs(grammar: &Grammar, config: &Config) -> Result<TokenStream> {
    let hooks = grammar.lex_hooks();
    if hooks.is_empty() {
        return Ok(TokenStream::new());
    }

    let lexer = config.lexer_trait();
    let state = &config.state;
    let methods = hooks
        .into_iter()
        .map(|hook| {
            let method = hook_ident(hook)?;
            Ok(quote! {
                fn #method(&self, _input: &str) -> ::parsegen::LexResult {
                    Ok((0, String::new()))
                }
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        impl #lexer for #state {
            #( #methods )*
        }
    })
}

fn generate_lexer_trait(grammar: &Grammar, config: &Config) -> Result<TokenStream> {
    let hooks = grammar.lex_hooks();
    if hooks.is_empty() {
        return Ok(TokenStream::new());
    }

    let lexer = config.lexer_trait();
    let methods = hooks
        .into_iter()
        .map(|hook| {
            let method = hook_ident(hook)?;
            Ok(quote! {
                fn #method(&self, input: &str) -> ::parsegen::LexResult;
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        /// Lexical hooks used by the grammar. Each returns the number of bytes
        /// consumed and the lexeme.
        pub trait #lexer {
            #( #methods )*
        }
    })
}

fn routine_ident(production: &str) -> Result<Ident> {
    syn::parse_str(&format!("parse_{}", production)).map_err(|_| EmitError::InvalidName {
        name: production.to_owned(),
    })
}

fn hook_ident(hook: &str) -> Result<Ident> {
    syn::parse_str(&format!("lex_{}", hook)).map_err(|_| EmitError::InvalidName {
        name: hook.to_owned(),
    })
}

fn var_ident(slot: usize) -> Ident {
    format_ident!("v{}", slot)
}

fn parse_type(production: &str, ty: &str) -> Result<Type> {
    syn::parse_str(ty).map_err(|_| EmitError::InvalidType {
        production: production.to_owned(),
        ty: ty.to_owned(),
    })
}

fn return_type(production: &str, types: &TypeRegistry) -> Result<Type> {
    parse_type(production, types.get(production).unwrap_or("()"))
}

/// Emits the routine for a single production.
///
/// Terms and alternation points are numbered in the same pre-order walk the
/// binding uses, so that each one finds its variable by ordinal.
struct ProductionEmitter<'a> {
    production: &'a Production,
    types: &'a TypeRegistry,
    config: &'a Config,
    binding: Binding,
    terms: usize,
    choices: usize,
}

impl<'a> ProductionEmitter<'a> {
    fn new(production: &'a Production, types: &'a TypeRegistry, config: &'a Config) -> Self {
        ProductionEmitter {
            production,
            types,
            config,
            binding: Binding::of(production, types),
            terms: 0,
            choices: 0,
        }
    }

    fn name(&self) -> &'a str {
        self.production.name.as_str()
    }

    fn inconsistent(&self, message: String) -> EmitError {
        EmitError::Inconsistent {
            production: self.name().to_owned(),
            message,
        }
    }

    fn emit(mut self) -> Result<TokenStream> {
        let production = self.production;
        let config = self.config;
        let name = self.name();
        let routine = routine_ident(name)?;
        let doc = production.rule();
        let state = &config.state;
        let ret = return_type(name, self.types)?;

        let storage = self
            .binding
            .variables()
            .iter()
            .map(|var| parse_type(name, &var.storage_type()))
            .collect::<Result<Vec<_>>>()?;
        let fields = storage
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                let ident = var_ident(i);
                quote!(#ident: #ty)
            })
            .collect::<Vec<_>>();
        let mark_types = storage
            .iter()
            .map(|ty| quote!(<#ty as ::parsegen::Bindings>::Mark))
            .collect::<Vec<_>>();

        let idents = self.idents();
        let marks: Vec<Ident> = (0..idents.len()).map(|i| format_ident!("m{}", i)).collect();

        let body = self.expression(&production.expression)?;
        if self.terms != self.binding.term_count() || self.choices != self.binding.choice_count() {
            return Err(self.inconsistent(format!(
                "visited {} terms and {} alternation points, bound {} and {}",
                self.terms,
                self.choices,
                self.binding.term_count(),
                self.binding.choice_count()
            )));
        }

        let success = self.success(&ret)?;
        let failure = self.failure()?;

        debug!(
            production = name,
            variables = self.binding.variables().len(),
            "emitted routine"
        );
        Ok(quote! {
            #[doc = #doc]
            pub(super) fn #routine(p: &mut ::parsegen::State<'_, #state>) -> ::core::result::Result<#ret, ::parsegen::ParseError> {
                #[derive(Default)]
                struct Vars {
                    #( #fields ),*
                }

                impl ::parsegen::Bindings for Vars {
                    type Mark = ( #( #mark_types, )* );

                    fn mark(&self) -> Self::Mark {
                        ( #( ::parsegen::Bindings::mark(&self.#idents), )* )
                    }

                    fn rewind(&mut self, mark: Self::Mark) {
                        let ( #( #marks, )* ) = mark;
                        #( ::parsegen::Bindings::rewind(&mut self.#idents, #marks); )*
                    }
                }

                let mut vars = Vars::default();
                let result = p.apply(&mut vars, |p, vars| #body);
                match result {
                    Ok(()) => { #success }
                    Err(err) => { #failure }
                }
            }
        })
    }

    /// Ordered choice. Each alternative runs in turn until one succeeds; the
    /// error of the last one tried is the one reported.
    fn expression(&mut self, expr: &Expression) -> Result<TokenStream> {
        if let [alt] = expr.alternatives.as_slice() {
            return self.alternative(alt);
        }

        let ordinal = self.choices;
        self.choices += 1;

        let mut chain: Option<TokenStream> = None;
        for (i, alt) in expr.alternatives.iter().enumerate() {
            let body = self.alternative(alt)?;
            let index = Literal::usize_suffixed(i);
            let attempt = quote!(p.apply(vars, |p, vars| #body).map(|()| #index));
            chain = Some(match chain {
                None => attempt,
                Some(prev) => quote!(#prev.or_else(|_| #attempt)),
            });
        }

        let store = match self.binding.choice_slot(ordinal) {
            Some(slot) => self.store(slot)?,
            None => quote!(.map(|_| ())),
        };
        Ok(quote!({ #chain #store }))
    }

    fn alternative(&mut self, alt: &Alternative) -> Result<TokenStream> {
        let terms = alt
            .terms
            .iter()
            .map(|term| self.term(term))
            .collect::<Result<Vec<_>>>()?;
        Ok(quote!({
            #( #terms )*
            Ok(())
        }))
    }

    fn term(&mut self, term: &Term) -> Result<TokenStream> {
        let ordinal = self.terms;
        self.terms += 1;

        let call = match term {
            Term::Production(name) => {
                let routine = routine_ident(name.as_str())?;
                quote!(#routine(p))
            }
            Term::Literal(lit) => {
                let lit = lit.as_str();
                quote!(p.literal(#lit))
            }
            Term::Lex(hook) => {
                let method = hook_ident(hook.as_str())?;
                let hook = hook.as_str();
                let state = &self.config.state;
                let lexer = self.config.lexer_trait();
                quote!(p.lex(#hook, <#state as #lexer>::#method))
            }
            Term::Sub(gor) => {
                let body = self.expression(gor.expression())?;
                let method = match gor {
                    Gor::Group(_) => format_ident!("group"),
                    Gor::Optional(_) => format_ident!("optional"),
                    Gor::Repeat(_) => format_ident!("repeat"),
                };
                quote!(p.#method(vars, |p, vars| #body))
            }
        };

        Ok(match self.binding.term_slot(ordinal) {
            Some(slot) => {
                let store = self.store(slot)?;
                quote!(#call #store?;)
            }
            None => quote!(#call?;),
        })
    }

    /// Store a successful term's value in its variable.
    fn store(&self, slot: usize) -> Result<TokenStream> {
        let var = self
            .binding
            .variables()
            .get(slot)
            .ok_or_else(|| self.inconsistent(format!("no variable in slot {}", slot)))?;
        let ident = var_ident(slot);
        Ok(if var.repeated {
            quote!(.map(|value| vars.#ident.push(value)))
        } else {
            quote!(.map(|value| { vars.#ident = Some(value); }))
        })
    }

    fn idents(&self) -> Vec<Ident> {
        (0..self.binding.variables().len()).map(var_ident).collect()
    }

    fn code(&self, kind: &'static str, code: &str) -> Result<TokenStream> {
        code.parse().map_err(|e| EmitError::MalformedCode {
            production: self.name().to_owned(),
            kind,
            message: format!("{:?}", e),
        })
    }

    fn success(&self, ret: &Type) -> Result<TokenStream> {
        let code = match &self.production.action {
            Some(code) => self.code("action", code)?,
            None if self.types.is_typed(self.name()) => {
                return Ok(quote!(Ok(::core::default::Default::default())))
            }
            None => return Ok(quote!(Ok(()))),
        };

        let name = self.name();
        let state = &self.config.state;
        let idents = self.idents();
        let mut params = Vec::new();
        let mut unwraps = Vec::new();
        for (ident, var) in idents.iter().zip(self.binding.variables()) {
            let ty = parse_type(name, &var.value_type())?;
            params.push(quote!(#ident: #ty));
            if !var.repeated && !var.conditional {
                unwraps.push(quote!(let #ident = p.bound(#ident, #name)?;));
            }
        }

        Ok(quote! {
            fn action(state: &mut #state #(, #params)*) -> #ret {
                #code
            }

            let Vars { #( #idents ),* } = vars;
            #( #unwraps )*
            Ok(action(p.data_mut() #(, #idents)*))
        })
    }

    fn failure(&self) -> Result<TokenStream> {
        let code = match &self.production.error {
            Some(code) => self.code("error", code)?,
            None => return Ok(quote!(Err(err))),
        };

        let state = &self.config.state;
        let idents = self.idents();
        let params = idents
            .iter()
            .zip(self.binding.variables())
            .map(|(ident, var)| {
                let ty = parse_type(self.name(), &var.storage_type())?;
                Ok(quote!(#ident: #ty))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(quote! {
            fn on_error(state: &mut #state, err: ::parsegen::ParseError #(, #params)*, pos: usize, line: usize) -> ::parsegen::ParseError {
                #code
            }

            let pos = p.offset();
            let line = p.line();
            let Vars { #( #idents ),* } = vars;
            Err(on_error(p.data_mut(), err #(, #idents)*, pos, line))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use syn::parse_quote;

    fn squash(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn generate(grammar: &str, state: Type) -> Result<String> {
        let g: Grammar = grammar.parse().unwrap();
        let config = Config::new(format_ident!("Calc")).with_state(state);
        emit_source(&g, &TypeRegistry::from(&g), &config).map(|s| squash(&s))
    }

    fn assert_contains(haystack: &str, needle: &str) {
        let needle = squash(needle);
        assert!(
            haystack.contains(&needle),
            "missing:\n{}\nin:\n{}",
            needle,
            haystack
        );
    }

    #[test]
    fn stub_hooks() {
        let g: Grammar = "a = lex(word) lex(num) ;".parse().unwrap();
        let config = Config::new(format_ident!("Calc")).with_state(parse_quote!(Env));
        let got = stubs(&g, &config).unwrap();
        let expected = quote! {
            impl CalcLexer for Env {
                fn lex_num(&self, _input: &str) -> ::parsegen::LexResult {
                    Ok((0, String::new()))
                }
                fn lex_word(&self, _input: &str) -> ::parsegen::LexResult {
                    Ok((0, String::new()))
                }
            }
        };
        assert_eq!(got.to_string(), expected.to_string());
    }

    #[test]
    fn no_stubs_without_hooks() {
        let g: Grammar = "a = \"x\" ;".parse().unwrap();
        let config = Config::new(format_ident!("Calc")).with_stubs(true);
        assert!(stubs(&g, &config).unwrap().is_empty());
    }

    #[test]
    fn parser_impl() {
        let got = generate(
            r#"Program : i64 = Sum ; Sum : i64 = lex(number) ; action { 1 }"#,
            parse_quote!(Env),
        )
        .unwrap();

        assert_contains(&got, "pub trait CalcLexer { fn lex_number(&self, input: &str) -> ::parsegen::LexResult; }");
        assert_contains(&got, "impl ::parsegen::Parser for Calc { type State = Env; type Output = i64;");
        assert_contains(&got, "::parsegen::State::run(input, state, productions::parse_Program)");
        assert_contains(&got, "#[doc = \"Sum = lex(number) ;\"]");
        assert_contains(&got, "pub(super) fn parse_Sum(p: &mut ::parsegen::State<'_, Env>) -> ::core::result::Result<i64, ::parsegen::ParseError>");
        assert_contains(&got, "p.lex(\"number\", <Env as CalcLexer>::lex_number).map(|value| { vars.v0 = Some(value); })?;");
        // A typed production without an action yields the default value.
        assert_contains(&got, "vars.v0 = Some(value); })?; Ok(()) }); match result { Ok(()) => { Ok(::core::default::Default::default()) }");
    }

    #[test]
    fn bindings_wired_in_order() {
        let got = generate(
            r#"Pairs : String = Word { "," Word } ";" ; action { String::new() }
               Word : String = lex(word) ; action { v0 }"#,
            parse_quote!(()),
        )
        .unwrap();

        assert_contains(&got, "struct Vars { v0: Option<String>, v1: Vec<&'static str>, v2: Vec<String>, v3: Option<&'static str> }");
        assert_contains(&got, "type Mark = (<Option<String> as ::parsegen::Bindings>::Mark, <Vec<&'static str> as ::parsegen::Bindings>::Mark,");
        assert_contains(&got, "fn mark(&self) -> Self::Mark { (::parsegen::Bindings::mark(&self.v0), ::parsegen::Bindings::mark(&self.v1), ::parsegen::Bindings::mark(&self.v2), ::parsegen::Bindings::mark(&self.v3),) }");
        assert_contains(&got, "let (m0, m1, m2, m3,) = mark; ::parsegen::Bindings::rewind(&mut self.v0, m0); ::parsegen::Bindings::rewind(&mut self.v1, m1);");
        assert_contains(&got, "parse_Word(p).map(|value| { vars.v0 = Some(value); })?;");
        assert_contains(&got, "p.repeat(vars, |p, vars| { p.literal(\",\").map(|value| vars.v1.push(value))?; parse_Word(p).map(|value| vars.v2.push(value))?; Ok(()) })?;");
        assert_contains(&got, "fn action(state: &mut (), v0: String, v1: Vec<&'static str>, v2: Vec<String>, v3: &'static str) -> String { String::new() }");
        assert_contains(&got, "let v0 = p.bound(v0, \"Pairs\")?; let v3 = p.bound(v3, \"Pairs\")?;");
        assert_contains(&got, "Ok(action(p.data_mut(), v0, v1, v2, v3))");
    }

    #[test]
    fn alternatives_record_index() {
        let got = generate(r#"S = "a" | "b" ; action { let _ = v0; }"#, parse_quote!(())).unwrap();

        assert_contains(
            &got,
            "{ p.apply(vars, |p, vars| { p.literal(\"a\").map(|value| { vars.v1 = Some(value); })?; Ok(()) }).map(|()| 0usize)
               .or_else(|_| p.apply(vars, |p, vars| { p.literal(\"b\").map(|value| { vars.v2 = Some(value); })?; Ok(()) }).map(|()| 1usize))
               .map(|value| { vars.v0 = Some(value); }) }",
        );
        assert_contains(&got, "fn action(state: &mut (), v0: usize, v1: Option<&'static str>, v2: Option<&'static str>) -> ()");
    }

    #[test]
    fn plain_alternatives_and_gors() {
        let got = generate(r#"S = [ "a" ] ( "b" | "c" ) ;"#, parse_quote!(())).unwrap();

        assert_contains(&got, "p.optional(vars, |p, vars| { p.literal(\"a\")?; Ok(()) })?;");
        assert_contains(&got, ".map(|()| 1usize)).map(|_| ()) })?; Ok(()) });");
        assert_contains(&got, "struct Vars {} impl ::parsegen::Bindings for Vars { type Mark = (); fn mark(&self) -> Self::Mark { () } fn rewind(&mut self, mark: Self::Mark) { let () = mark; } }");
        assert_contains(&got, "Ok(()) => { Ok(()) } Err(err) => { Err(err) }");
    }

    #[test]
    fn error_handler() {
        let got = generate(
            r#"Block = "begin" { lex(item) } "end" ; error { ParseError::custom(line, format!("{} at {}", err, pos)) }"#,
            parse_quote!(Env),
        )
        .unwrap();

        assert_contains(&got, "fn on_error(state: &mut Env, err: ::parsegen::ParseError, v0: Option<&'static str>, v1: Vec<String>, v2: Option<&'static str>, pos: usize, line: usize) -> ::parsegen::ParseError");
        assert_contains(&got, "Err(on_error(p.data_mut(), err, v0, v1, v2, pos, line))");
    }

    #[test]
    fn invalid_type() {
        let err = generate("S : Vec< = \"a\" ;", parse_quote!(())).unwrap_err();
        assert_eq!(
            err,
            EmitError::InvalidType {
                production: "S".to_owned(),
                ty: "Vec<".to_owned()
            }
        );
    }

    #[test]
    fn malformed_action() {
        let err = generate("S = \"a\" ; action { ( }", parse_quote!(())).unwrap_err();
        assert!(
            matches!(err, EmitError::MalformedCode { ref production, kind: "action", .. } if production == "S"),
            "{:?}",
            err
        );
    }

    #[test]
    fn invalid_production_name() {
        let mut g = Grammar::new();
        g.add(Production::new(
            "not-a-name",
            Expression::sequence(vec![Term::Literal("x".into())]),
        ))
        .unwrap();
        let config = Config::new(format_ident!("P"));
        let err = emit(&g, &TypeRegistry::new(), &config).unwrap_err();
        assert_eq!(
            err,
            EmitError::InvalidName {
                name: "not-a-name".to_owned()
            }
        );
    }

    #[test]
    fn empty_grammar() {
        let config = Config::new(format_ident!("P"));
        let err = emit(&Grammar::new(), &TypeRegistry::new(), &config).unwrap_err();
        assert_eq!(err, EmitError::Grammar(GrammarError::MissingEntryPoint));
    }
}

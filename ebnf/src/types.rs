//! Semantic types attached to productions.

use std::collections::HashMap;

use crate::Grammar;

/// Maps production names to the Rust type their parse routine returns.
/// Productions without an entry return `()` and bind nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: HashMap<String, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the type of a production, replacing any earlier declaration.
    pub fn declare(&mut self, production: &str, ty: &str) {
        self.types.insert(production.to_owned(), ty.to_owned());
    }

    pub fn get(&self, production: &str) -> Option<&str> {
        self.types.get(production).map(String::as_str)
    }

    pub fn is_typed(&self, production: &str) -> bool {
        self.types.contains_key(production)
    }
}

impl From<&Grammar> for TypeRegistry {
    fn from(grammar: &Grammar) -> Self {
        let mut registry = TypeRegistry::new();
        for production in grammar.productions() {
            if let Some(ty) = &production.ty {
                registry.declare(production.name.as_str(), ty);
            }
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_types() {
        let grammar: Grammar = "a : Vec<u8> = b ; b = \"x\" ;".parse().unwrap();
        let mut types = TypeRegistry::from(&grammar);

        assert_eq!(types.get("a"), Some("Vec<u8>"));
        assert!(!types.is_typed("b"));

        types.declare("a", "String");
        types.declare("b", "char");
        assert_eq!(types.get("a"), Some("String"));
        assert_eq!(types.get("b"), Some("char"));
        assert_eq!(types.get("c"), None);
    }
}

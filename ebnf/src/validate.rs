use std::collections::{HashSet, VecDeque};

use tracing::{debug, trace};

use crate::{Grammar, GrammarError, Result};

/// Check that a grammar is usable: it has an entry point, every referenced
/// production is defined, and every production is reachable from the entry
/// point.
pub fn verify(grammar: &Grammar) -> Result<()> {
    let entry = grammar.entry().ok_or(GrammarError::MissingEntryPoint)?;

    if let Some(undefined) = grammar
        .referenced()
        .iter()
        .find(|name| grammar.get(name.as_str()).is_none())
    {
        return Err(GrammarError::UndefinedProduction(undefined.0.clone()));
    }

    let mut reached: HashSet<&str> = HashSet::new();
    let mut queue = VecDeque::new();
    reached.insert(entry.as_str());
    queue.push_back(entry.as_str());

    while let Some(name) = queue.pop_front() {
        trace!(production = name, "visiting");
        // Every name was checked as defined above.
        let production = match grammar.get(name) {
            Some(p) => p,
            None => continue,
        };
        for next in production.expression.names() {
            if reached.insert(next.as_str()) {
                queue.push_back(next.as_str());
            }
        }
    }

    if let Some(unused) = grammar
        .productions()
        .iter()
        .find(|p| !reached.contains(p.name.as_str()))
    {
        return Err(GrammarError::UnusedProduction(unused.name.0.clone()));
    }

    debug!(entry = entry.as_str(), reached = reached.len(), "grammar verified");
    Ok(())
}

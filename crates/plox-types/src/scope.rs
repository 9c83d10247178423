// crates/plox-types/src/scope.rs
// Lexically scoped name bindings, shared by the checker and the interpreter

use std::collections::HashMap;
use tracing::trace;

#[derive(Debug)]
struct Scope<T> {
    vars: HashMap<String, T>,
    parent: Option<usize>,
}

/// A chain of nested scopes stored in an arena.
///
/// Index 0 is the global scope and is never popped. Each pushed scope
/// records its parent's index; lookups walk from the current scope out to
/// the global one.
#[derive(Debug)]
pub struct ScopeChain<T> {
    scopes: Vec<Scope<T>>,
    current: usize,
}

impl<T> Default for ScopeChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScopeChain<T> {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                vars: HashMap::new(),
                parent: None,
            }],
            current: 0,
        }
    }

    /// Enter a child of the current scope.
    pub fn push(&mut self) {
        self.scopes.push(Scope {
            vars: HashMap::new(),
            parent: Some(self.current),
        });
        self.current = self.scopes.len() - 1;
        trace!(depth = self.depth(), "scope push");
    }

    /// Leave the current scope, dropping its bindings.
    ///
    /// Returns `false` (and does nothing) at the global scope.
    pub fn pop(&mut self) -> bool {
        let Some(parent) = self.scopes[self.current].parent else {
            return false;
        };
        self.scopes.truncate(self.current);
        self.current = parent;
        trace!(depth = self.depth(), "scope pop");
        true
    }

    /// Number of scopes above the global one.
    pub fn depth(&self) -> usize {
        let mut n = 0;
        let mut at = self.current;
        while let Some(parent) = self.scopes[at].parent {
            n += 1;
            at = parent;
        }
        n
    }

    /// Bind `name` in the current scope, replacing any binding it already has
    /// there. Outer bindings are shadowed, not touched.
    pub fn define(&mut self, name: impl Into<String>, value: T) {
        self.scopes[self.current].vars.insert(name.into(), value);
    }

    fn resolve(&self, name: &str) -> Option<usize> {
        let mut at = Some(self.current);
        while let Some(idx) = at {
            if self.scopes[idx].vars.contains_key(name) {
                return Some(idx);
            }
            at = self.scopes[idx].parent;
        }
        None
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.resolve(name).and_then(|idx| self.scopes[idx].vars.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        let idx = self.resolve(name)?;
        self.scopes[idx].vars.get_mut(name)
    }

    /// Overwrite the nearest existing binding of `name`.
    ///
    /// Returns `false` when no enclosing scope binds it; nothing is created.
    pub fn assign(&mut self, name: &str, value: T) -> bool {
        match self.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

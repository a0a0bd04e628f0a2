use std::collections::HashMap;

/// Index of a scope inside an [`Environment`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);
}

#[derive(Debug)]
struct Scope<V> {
    parent: Option<ScopeId>,
    /// The scope that was current when this one was pushed.
    return_to: Option<ScopeId>,
    table: HashMap<String, V>,
}

/// Chained lexical scopes mapping names to values.
///
/// Scopes live in an arena and refer to their parents by index. The arena only
/// grows and shrinks at its end, so a parent always outlives its children as
/// long as scopes are popped in the reverse order they were pushed.
#[derive(Debug)]
pub struct Environment<V> {
    scopes: Vec<Scope<V>>,
    current: ScopeId,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("undefined name '{0}'")]
pub struct Undefined(pub String);

impl<V> Default for Environment<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Environment<V> {
    pub fn new() -> Environment<V> {
        Environment {
            scopes: vec![Scope {
                parent: None,
                return_to: None,
                table: HashMap::new(),
            }],
            current: ScopeId::ROOT,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Number of scopes between the current one and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.current;
        while let Some(parent) = self.scopes[scope.0].parent {
            depth += 1;
            scope = parent;
        }
        depth
    }

    /// Opens a child of the current scope and makes it current.
    pub fn push(&mut self) -> ScopeId {
        self.push_child_of(self.current)
    }

    /// Opens a scope under `parent`, which must be live, and makes it current.
    pub fn push_child_of(&mut self, parent: ScopeId) -> ScopeId {
        debug_assert!(parent.0 < self.scopes.len(), "dead parent scope");
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(parent),
            return_to: Some(self.current),
            table: HashMap::new(),
        });
        self.current = id;
        id
    }

    /// Discards the current scope and returns to the one that was current
    /// when it was pushed.
    ///
    /// # Panics
    ///
    /// Popping the root scope, or a scope other than the most recent one, is
    /// a logic error.
    pub fn pop(&mut self) {
        assert_ne!(self.current, ScopeId::ROOT, "cannot pop the root scope");
        assert_eq!(
            self.current.0 + 1,
            self.scopes.len(),
            "scopes must be popped in reverse order"
        );
        if let Some(Scope {
            return_to: Some(previous),
            ..
        }) = self.scopes.pop()
        {
            self.current = previous;
        }
    }

    /// Binds `name` to `value` in the current scope, shadowing any binding of
    /// the same name in an ancestor.
    pub fn bind(&mut self, name: impl Into<String>, value: V) {
        self.scopes[self.current.0].table.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.lookup_from(self.current, name)
    }

    /// Resolves `name` starting at `scope` and walking up its ancestors.
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<&V> {
        let mut scope = Some(scope);
        while let Some(id) = scope {
            let Scope { parent, table, .. } = &self.scopes[id.0];
            if let Some(value) = table.get(name) {
                return Some(value);
            }
            scope = *parent;
        }
        None
    }

    /// Overwrites the nearest existing binding of `name`.
    pub fn set(&mut self, name: &str, value: V) -> Result<(), Undefined> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let Scope { parent, table, .. } = &mut self.scopes[id.0];
            if let Some(slot) = table.get_mut(name) {
                *slot = value;
                return Ok(());
            }
            scope = *parent;
        }
        Err(Undefined(name.to_owned()))
    }
}

impl<V: Default> Environment<V> {
    /// Binds `name` to the default value in the current scope.
    pub fn define(&mut self, name: impl Into<String>) {
        self.bind(name, V::default());
    }
}

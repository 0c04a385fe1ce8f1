//! Scope resolution shared by the parser and the generator.
//!
//! A definition belongs to the most specific enclosing service, else the most
//! specific enclosing namespace, else a namespace created from its dotted
//! prefix, else the global scope. "Enclosing" means a dotted prefix
//! (`a.b` encloses `a.b.C` but not `a.bc.D`); among several enclosing scopes
//! the longest name wins.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ast::Definition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Service,
    Namespace,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

#[derive(Debug, Clone)]
/// One bucket of definitions keyed by fully qualified name.
pub struct Scope {
    name: String,
    kind: ScopeKind,
    definitions: IndexMap<String, Definition>,
}

impl Scope {
    /// Scope name; empty for the global scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn definitions(&self) -> &IndexMap<String, Definition> {
        &self.definitions
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[derive(Debug, Clone)]
/// Ordered set of scopes plus the owner of every inserted definition.
pub struct ScopeTable {
    scopes: Vec<Scope>,
    owners: HashMap<String, ScopeId>,
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                name: String::new(),
                kind: ScopeKind::Global,
                definitions: IndexMap::new(),
            }],
            owners: HashMap::new(),
        }
    }

    pub fn global_id(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Declares a named scope, returning the existing one if already declared.
    pub fn declare(&mut self, name: &str, kind: ScopeKind) -> ScopeId {
        if let Some(index) = self
            .scopes
            .iter()
            .position(|scope| scope.kind == kind && scope.name == name)
        {
            return ScopeId(index);
        }
        log::debug!("declaring {:?} scope '{}'", kind, name);
        self.scopes.push(Scope {
            name: name.to_string(),
            kind,
            definitions: IndexMap::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// Longest declared scope of `kind` that encloses `name`.
    pub fn find_enclosing(&self, name: &str, kind: ScopeKind) -> Option<ScopeId> {
        self.scopes
            .iter()
            .enumerate()
            .filter(|(_, scope)| scope.kind == kind && encloses(&scope.name, name))
            .max_by_key(|(_, scope)| scope.name.len())
            .map(|(index, _)| ScopeId(index))
    }

    /// Resolves the owning scope of a definition, creating a namespace from
    /// its dotted prefix when nothing encloses it yet.
    pub fn owner_for(&mut self, name: &str) -> ScopeId {
        if let Some(id) = self.find_enclosing(name, ScopeKind::Service) {
            return id;
        }
        if let Some(id) = self.find_enclosing(name, ScopeKind::Namespace) {
            return id;
        }
        match namespace_prefix(name) {
            Some(prefix) => self.declare(prefix, ScopeKind::Namespace),
            None => self.global_id(),
        }
    }

    pub fn insert(&mut self, id: ScopeId, name: String, definition: Definition) {
        self.owners.insert(name.clone(), id);
        self.scopes[id.0].definitions.insert(name, definition);
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Scope that owns the definition `name`, if it was inserted.
    pub fn scope_of(&self, name: &str) -> Option<&Scope> {
        self.owners.get(name).map(|id| &self.scopes[id.0])
    }

    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.scope_of(name)
            .and_then(|scope| scope.definitions.get(name))
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn services(&self) -> impl Iterator<Item = &Scope> {
        self.scopes_of_kind(ScopeKind::Service)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Scope> {
        self.scopes_of_kind(ScopeKind::Namespace)
    }

    pub fn global(&self) -> &Scope {
        &self.scopes[0]
    }

    fn scopes_of_kind(&self, kind: ScopeKind) -> impl Iterator<Item = &Scope> {
        self.scopes.iter().filter(move |scope| scope.kind == kind)
    }
}

/// `true` when `scope` is a dotted prefix of `name`.
pub fn encloses(scope: &str, name: &str) -> bool {
    !scope.is_empty()
        && name.len() > scope.len()
        && name.starts_with(scope)
        && name.as_bytes()[scope.len()] == b'.'
}

/// Everything before the last dot, if the name is qualified.
pub fn namespace_prefix(name: &str) -> Option<&str> {
    name.rfind('.')
        .map(|index| &name[..index])
        .filter(|prefix| !prefix.is_empty())
}

//! Namespace aggregation: one generation unit per service, namespace and the
//! global scope, with definitions split by category.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::ast::{
    ActionFunctionDef, AliasBody, Definition, Element, EntityDef, EnumDef, EnumValue,
    TypeAliasDef,
};
use crate::parser::ParsedSchema;
use crate::resolve::{
    entity_identifier, inline_enum_identifier, sanitized_identifier, ActionNames,
};
use crate::scope::{Scope, ScopeKind};

pub const ENTITY_ENUM_NAME: &str = "Entity";
pub const SANITIZED_ENTITY_ENUM_NAME: &str = "SanitizedEntity";

/// Borrowed definition together with its fully qualified name.
#[derive(Debug, Clone, Copy)]
pub struct Named<'a, T> {
    pub name: &'a str,
    pub definition: &'a T,
    /// The enclosing variant `definition` was taken from.
    pub source: &'a Definition,
}

/// Definitions of one scope, grouped the way they are emitted.
#[derive(Debug, Clone)]
pub struct Namespace<'a> {
    name: &'a str,
    kind: ScopeKind,
    entities: Vec<Named<'a, EntityDef>>,
    enums: Vec<Named<'a, EnumDef>>,
    type_aliases: Vec<Named<'a, TypeAliasDef>>,
    actions: Vec<Named<'a, ActionFunctionDef>>,
}

impl<'a> Namespace<'a> {
    pub fn from_scope(scope: &'a Scope, sort: bool) -> Self {
        let mut out = Self {
            name: scope.name(),
            kind: scope.kind(),
            entities: Vec::new(),
            enums: Vec::new(),
            type_aliases: Vec::new(),
            actions: Vec::new(),
        };

        for (name, source) in scope.definitions() {
            let name = name.as_str();
            match source {
                Definition::Entity(definition) => out.entities.push(Named {
                    name,
                    definition,
                    source,
                }),
                Definition::Enum(definition) => out.enums.push(Named {
                    name,
                    definition,
                    source,
                }),
                Definition::TypeAlias(definition) => out.type_aliases.push(Named {
                    name,
                    definition,
                    source,
                }),
                Definition::ActionFunction(definition) => out.actions.push(Named {
                    name,
                    definition,
                    source,
                }),
            }
        }

        if sort {
            out.entities.sort_by(|a, b| a.name.cmp(b.name));
            out.enums.sort_by(|a, b| a.name.cmp(b.name));
            out.type_aliases.sort_by(|a, b| a.name.cmp(b.name));
            out.actions.sort_by(|a, b| a.name.cmp(b.name));
        }
        out
    }

    /// Namespace name; empty for the global scope.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn entities(&self) -> &[Named<'a, EntityDef>] {
        &self.entities
    }

    pub fn enums(&self) -> &[Named<'a, EnumDef>] {
        &self.enums
    }

    pub fn type_aliases(&self) -> &[Named<'a, TypeAliasDef>] {
        &self.type_aliases
    }

    pub fn actions(&self) -> &[Named<'a, ActionFunctionDef>] {
        &self.actions
    }

    /// Every definition in emission order: aliases, enums, entities, actions.
    pub fn emission_order(&self) -> impl Iterator<Item = (&'a str, &'a Definition)> + '_ {
        let aliases = self.type_aliases.iter().map(|n| (n.name, n.source));
        let enums = self.enums.iter().map(|n| (n.name, n.source));
        let entities = self.entities.iter().map(|n| (n.name, n.source));
        let actions = self.actions.iter().map(|n| (n.name, n.source));
        aliases.chain(enums).chain(entities).chain(actions)
    }

    /// `Entity` enum: sanitized entity name to fully qualified name.
    pub fn entity_enum(&self) -> EnumDef {
        self.synthetic_enum(|name| name.to_string())
    }

    /// `SanitizedEntity` enum: sanitized entity name to itself.
    pub fn sanitized_entity_enum(&self) -> EnumDef {
        self.synthetic_enum(sanitized_identifier)
    }

    fn synthetic_enum(&self, value: impl Fn(&str) -> String) -> EnumDef {
        let mut members = IndexMap::new();
        for entity in &self.entities {
            members.insert(
                sanitized_identifier(entity.name),
                EnumValue {
                    val: Some(JsonValue::String(value(entity.name))),
                },
            );
        }
        EnumDef {
            primitive: "cds.String".to_string(),
            members,
        }
    }

    /// Every identifier this namespace declares in its own file.
    pub fn local_identifiers(&self, prefix: &str) -> HashSet<String> {
        let mut out = HashSet::new();
        out.insert(ENTITY_ENUM_NAME.to_string());
        out.insert(SANITIZED_ENTITY_ENUM_NAME.to_string());

        for alias in &self.type_aliases {
            out.insert(sanitized_identifier(alias.name));
            if let AliasBody::Structured(elements) = &alias.definition.body {
                for (field, element) in elements {
                    if element.enum_values.is_some() {
                        out.insert(inline_enum_identifier(alias.name, field));
                    }
                }
            }
        }
        for enum_def in &self.enums {
            out.insert(sanitized_identifier(enum_def.name));
        }
        for entity in &self.entities {
            out.insert(entity_identifier(prefix, entity.name));
            for (field, element) in &entity.definition.elements {
                if element.enum_values.is_some() {
                    out.insert(inline_enum_identifier(entity.name, field));
                }
            }
        }
        for action in &self.actions {
            let names = ActionNames::new(prefix, action.definition.kind.prefix(), action.name, None);
            out.insert(names.enum_name);
            out.insert(names.params_name);
            out.insert(names.return_name);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.enums.is_empty()
            && self.type_aliases.is_empty()
            && self.actions.is_empty()
    }
}

/// Groups a parsed schema into generation units: namespaces, then services,
/// then the global scope when it holds anything.
pub fn aggregate(parsed: &ParsedSchema, sort: bool) -> Vec<Namespace<'_>> {
    let mut namespaces: Vec<Namespace<'_>> = parsed
        .namespaces()
        .map(|scope| Namespace::from_scope(scope, sort))
        .collect();
    let mut services: Vec<Namespace<'_>> = parsed
        .services()
        .map(|scope| Namespace::from_scope(scope, sort))
        .collect();

    if sort {
        namespaces.sort_by(|a, b| a.name.cmp(b.name));
        services.sort_by(|a, b| a.name.cmp(b.name));
    }

    let mut out = namespaces;
    out.append(&mut services);

    let global = parsed.scopes().global();
    if !global.is_empty() {
        out.push(Namespace::from_scope(global, sort));
    }
    out
}

/// One referenceable definition.
#[derive(Debug, Clone)]
pub struct TypeEntry<'a> {
    /// Owning namespace; empty for the global scope.
    pub namespace: &'a str,
    /// Generated identifier, including the interface prefix for entity-shaped types.
    pub identifier: String,
    pub definition: &'a Definition,
}

/// Lookup of every parsed definition by fully qualified name.
#[derive(Debug, Clone)]
pub struct TypeIndex<'a> {
    prefix: String,
    entries: HashMap<&'a str, TypeEntry<'a>>,
}

impl<'a> TypeIndex<'a> {
    pub fn build(parsed: &'a ParsedSchema, prefix: &str) -> Self {
        let mut entries = HashMap::new();
        for scope in parsed.scopes().scopes() {
            for (name, definition) in scope.definitions() {
                let identifier = match definition {
                    Definition::Entity(_) => entity_identifier(prefix, name),
                    _ => sanitized_identifier(name),
                };
                entries.insert(
                    name.as_str(),
                    TypeEntry {
                        namespace: scope.name(),
                        identifier,
                        definition,
                    },
                );
            }
        }
        Self {
            prefix: prefix.to_string(),
            entries,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get(&self, name: &str) -> Option<&TypeEntry<'a>> {
        self.entries.get(name)
    }

    pub fn namespace_of(&self, name: &str) -> Option<&'a str> {
        self.entries.get(name).map(|entry| entry.namespace)
    }

    pub fn entity(&self, name: &str) -> Option<&'a EntityDef> {
        self.entries
            .get(name)
            .and_then(|entry| entry.definition.as_entity())
    }

    pub fn element(&self, entity: &str, element: &str) -> Option<&'a Element> {
        self.entity(entity)
            .and_then(|entity| entity.elements.get(element))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

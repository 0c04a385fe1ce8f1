//! Type resolution: CDS type names, association targets and element
//! references to TypeScript type expressions.
//!
//! A [`TypeResolver`] is bound to the namespace whose file is being
//! generated. References to declarations of other namespaces are recorded as
//! imports; the returned identifier is the local (possibly aliased) name.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::ast::{Cardinality, Definition, Element, EntityDef, TypeRef};
use crate::csn::is_builtin_type;
use crate::declaration::{Primitive, PropertySignature, TsType};
use crate::namespace::TypeIndex;

/// Maps a builtin CDS type name to its TypeScript primitive.
pub fn map_primitive(type_name: &str) -> Option<Primitive> {
    let primitive = match type_name {
        "cds.UUID" | "cds.String" | "cds.LargeString" | "User" => Primitive::String,
        "cds.Boolean" => Primitive::Boolean,
        "cds.Integer" | "cds.Integer64" | "cds.Decimal" | "cds.DecimalFloat" | "cds.Double"
        | "cds.hana.TINYINT" => Primitive::Number,
        "cds.Date" | "cds.Time" | "cds.DateTime" | "cds.Timestamp" => Primitive::Date,
        "cds.Binary" | "cds.LargeBinary" => Primitive::Buffer,
        _ => return None,
    };
    Some(primitive)
}

/// Short name of a fully qualified definition: the last segment, or the last
/// two for localized-text shadows (`my.Books.texts` -> `Books.texts`).
pub fn target_name(name: &str) -> &str {
    let mut segments = name.rsplitn(3, '.');
    let last = segments.next().unwrap_or(name);
    if last != "texts" {
        return last;
    }
    match segments.next() {
        Some(parent) => {
            let start = name.len() - last.len() - parent.len() - 1;
            &name[start..]
        }
        None => last,
    }
}

/// Uppercases the first letter; dotted names are joined into one word with
/// every segment capitalized (`sap.common` -> `SapCommon`).
pub fn sanitize_name(name: &str) -> String {
    if !name.contains('.') {
        return capitalize(name);
    }
    word_separator()
        .split(name)
        .flat_map(split_words)
        .map(capitalize)
        .collect()
}

/// Identifier of a non-interface declaration derived from its qualified name.
pub fn sanitized_identifier(name: &str) -> String {
    sanitize_name(target_name(name))
}

/// Interface identifier of an entity-shaped definition.
pub fn entity_identifier(prefix: &str, name: &str) -> String {
    format!("{prefix}{}", sanitized_identifier(name))
}

/// Identifier of the enum generated for an inline `enum` on an element.
pub fn inline_enum_identifier(owner: &str, field: &str) -> String {
    format!("{}{}", sanitized_identifier(owner), capitalize(field))
}

/// Identifiers generated for one action or function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionNames {
    pub short_name: String,
    pub enum_name: String,
    pub params_name: String,
    pub return_name: String,
}

impl ActionNames {
    /// `bound_owner` is the qualified entity name for bound actions.
    pub fn new(prefix: &str, kind_prefix: &str, name: &str, bound_owner: Option<&str>) -> Self {
        let short_name = target_name(name).to_string();
        let scope = bound_owner
            .map(|owner| format!("{}Actions", sanitized_identifier(owner)))
            .unwrap_or_default();
        let base = format!("{scope}{kind_prefix}{}", sanitize_name(&short_name));
        Self {
            short_name,
            enum_name: base.clone(),
            params_name: format!("{prefix}{base}Params"),
            return_name: format!("{base}Return"),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn word_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid regex"))
}

/// Splits a camel-cased chunk at case and digit boundaries, keeping case.
fn split_words(chunk: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = chunk.char_indices().collect();
    let mut words = Vec::new();
    let mut start = 0usize;

    for i in 1..chars.len() {
        let (offset, curr) = chars[i];
        let prev = chars[i - 1].1;
        let next = chars.get(i + 1).map(|(_, c)| *c);

        let boundary = (prev.is_ascii_lowercase() && curr.is_ascii_uppercase())
            || (prev.is_ascii_alphabetic() && curr.is_ascii_digit())
            || (prev.is_ascii_digit() && curr.is_ascii_alphabetic())
            || (prev.is_ascii_uppercase()
                && curr.is_ascii_uppercase()
                && next.map(|n| n.is_ascii_lowercase()).unwrap_or(false));

        if boundary {
            words.push(&chunk[start..offset]);
            start = offset;
        }
    }
    if start < chunk.len() {
        words.push(&chunk[start..]);
    }
    words
}

/// Imports requested by one file: source namespace -> identifier -> local name.
pub type ImportTable = BTreeMap<String, BTreeMap<String, String>>;

/// Resolves types relative to one namespace, collecting imports and warnings.
pub struct TypeResolver<'a> {
    index: &'a TypeIndex<'a>,
    namespace: &'a str,
    local_names: HashSet<String>,
    taken: HashSet<String>,
    imports: ImportTable,
    warnings: Vec<String>,
}

impl<'a> TypeResolver<'a> {
    /// `local_names` are the identifiers declared in the namespace itself;
    /// imports that would shadow one of them are aliased.
    pub fn new(index: &'a TypeIndex<'a>, namespace: &'a str, local_names: HashSet<String>) -> Self {
        Self {
            index,
            namespace,
            local_names,
            taken: HashSet::new(),
            imports: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        self.index.prefix()
    }

    /// Resolves a builtin or user-defined type name.
    pub fn resolve_type_name(&mut self, type_name: &str) -> TsType {
        if let Some(primitive) = map_primitive(type_name) {
            return TsType::Primitive(primitive);
        }
        if is_builtin_type(type_name) {
            self.warn(format!("builtin type '{type_name}' has no TypeScript mapping"));
            return TsType::Unknown;
        }
        match self.reference(type_name) {
            Some(ty) => ty,
            None => {
                self.warn(format!("unable to resolve type '{type_name}'"));
                TsType::Unknown
            }
        }
    }

    /// Resolves an element, parameter or return type position.
    pub fn resolve_type_ref(&mut self, type_ref: Option<&TypeRef>) -> TsType {
        match type_ref {
            None => TsType::Unknown,
            Some(TypeRef::Named(name)) => self.resolve_type_name(name),
            Some(TypeRef::ElementRef { entity, element }) => {
                match self.index.element(entity, element) {
                    Some(found) => self.resolve_element(entity, element, found),
                    None => {
                        self.warn(format!(
                            "unable to resolve element reference '{entity}:{element}'"
                        ));
                        TsType::Unknown
                    }
                }
            }
        }
    }

    /// Type of element `field` declared on `owner`.
    pub fn resolve_element(&mut self, owner: &str, field: &str, element: &Element) -> TsType {
        if element.enum_values.is_some() {
            return self
                .inline_enum_reference(owner, field)
                .array_if(element.is_many());
        }
        if element.is_navigation() {
            return match &element.target {
                Some(target) => self.resolve_target(target, element.cardinality),
                None => {
                    self.warn(format!("association '{owner}.{field}' has no target"));
                    TsType::Unknown
                }
            };
        }
        self.resolve_type_ref(element.type_ref.as_ref())
            .array_if(element.is_many())
    }

    /// Association target; to-many targets resolve to an array.
    pub fn resolve_target(&mut self, target: &str, cardinality: Cardinality) -> TsType {
        let ty = match self.reference(target) {
            Some(ty) => ty,
            None => {
                self.warn(format!("unable to resolve association target '{target}'"));
                TsType::Unknown
            }
        };
        ty.array_if(cardinality == Cardinality::Many)
    }

    /// Interface identifier for an `includes` entry, if it names an entity-shaped definition.
    pub fn resolve_include(&mut self, name: &str) -> Option<(String, &'a EntityDef)> {
        let entity = self.index.entity(name)?;
        match self.reference(name)? {
            TsType::Reference(identifier) => Some((identifier, entity)),
            _ => None,
        }
    }

    /// Foreign-key fields synthesized after a to-one managed association.
    pub fn foreign_keys(
        &mut self,
        field: &str,
        element: &Element,
        separator: &str,
    ) -> Vec<PropertySignature> {
        if element.is_many() || element.keys.is_empty() {
            return Vec::new();
        }
        let Some(target) = element.target.as_deref() else {
            return Vec::new();
        };
        let Some(target_entity) = self.index.entity(target) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for key in &element.keys {
            let Some(key_name) = key.element() else {
                continue;
            };
            let Some(key_element) = target_entity.elements.get(key_name) else {
                self.warn(format!(
                    "foreign key '{key_name}' of '{field}' is not an element of '{target}'"
                ));
                continue;
            };
            let ty = self.resolve_type_ref(key_element.type_ref.as_ref());
            out.push(PropertySignature {
                name: format!("{field}{separator}{key_name}"),
                optional: true,
                ty,
            });
        }
        out
    }

    pub fn into_parts(self) -> (ImportTable, Vec<String>) {
        (self.imports, self.warnings)
    }

    fn inline_enum_reference(&mut self, owner: &str, field: &str) -> TsType {
        let identifier = inline_enum_identifier(owner, field);
        match self.index.namespace_of(owner) {
            Some(namespace) if namespace != self.namespace => {
                TsType::Reference(self.import(namespace, &identifier))
            }
            _ => TsType::Reference(identifier),
        }
    }

    /// Reference to a user definition, recording an import when it lives elsewhere.
    fn reference(&mut self, name: &str) -> Option<TsType> {
        let index = self.index;
        let entry = index.get(name)?;
        if matches!(entry.definition, Definition::ActionFunction(_)) {
            return None;
        }
        if entry.namespace == self.namespace {
            return Some(TsType::Reference(entry.identifier.clone()));
        }
        Some(TsType::Reference(self.import(entry.namespace, &entry.identifier)))
    }

    fn import(&mut self, namespace: &str, identifier: &str) -> String {
        if let Some(local) = self
            .imports
            .get(namespace)
            .and_then(|names| names.get(identifier))
        {
            return local.clone();
        }

        let mut local = identifier.to_string();
        if self.local_names.contains(&local) || self.taken.contains(&local) {
            let qualifier = if namespace.is_empty() {
                "Global".to_string()
            } else {
                sanitize_name(namespace)
            };
            local = format!("{qualifier}{identifier}");
            log::debug!(
                "aliasing import '{}' from '{}' as '{}'",
                identifier,
                namespace,
                local
            );
        }
        self.taken.insert(local.clone());
        self.imports
            .entry(namespace.to_string())
            .or_default()
            .insert(identifier.to_string(), local.clone());
        local
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }
}

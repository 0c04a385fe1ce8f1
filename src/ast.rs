//! Normalized intermediate model produced by the parser.
//!
//! Every map keeps insertion order from the compiled schema, which drives the
//! order of generated members.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::csn::{self, ASSOCIATION, COMPOSITION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Element multiplicity.
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Type position of an element, parameter or return value.
pub enum TypeRef {
    /// Builtin primitive or fully qualified definition name.
    Named(String),
    /// `{ref: [Entity, element]}`: the type of an element of another definition.
    ElementRef { entity: String, element: String },
}

impl TypeRef {
    pub fn named(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::ElementRef { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Foreign-key reference of a managed association (`keys: [{ref: [...]}]`).
pub struct ForeignKey {
    pub path: Vec<String>,
}

impl ForeignKey {
    /// Name of the referenced element on the association target.
    pub fn element(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One enum entry; `val` is absent for auto-numbered members.
pub struct EnumValue {
    pub val: Option<JsonValue>,
}

impl EnumValue {
    /// Falsy values (absent, `null`, `false`, `0`, `""`) emit no initializer.
    pub fn has_initializer(&self) -> bool {
        csn::is_truthy(self.val.as_ref())
    }
}

pub type EnumMembers = IndexMap<String, EnumValue>;

#[derive(Debug, Clone, PartialEq)]
/// Field of an entity or structured type.
pub struct Element {
    /// `None` only for virtual fields and for array items without a scalar type.
    pub type_ref: Option<TypeRef>,
    pub target: Option<String>,
    pub cardinality: Cardinality,
    pub can_be_null: bool,
    pub keys: Vec<ForeignKey>,
    pub enum_values: Option<EnumMembers>,
}

impl Element {
    /// Association or composition, by declared type or by carrying a `target`.
    pub fn is_navigation(&self) -> bool {
        self.target.is_some() || self.is_association_type()
    }

    pub fn is_association_type(&self) -> bool {
        matches!(
            self.type_ref.as_ref().and_then(TypeRef::named),
            Some(ASSOCIATION) | Some(COMPOSITION)
        )
    }

    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

pub type Elements = IndexMap<String, Element>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Entity,
    /// `kind: type` with inline `elements`; generated like an entity.
    StructuredType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    pub kind: EntityKind,
    pub elements: Elements,
    /// Bound actions and functions.
    pub actions: IndexMap<String, ActionFunctionDef>,
    /// Fully qualified names of definitions whose fields this one inherits.
    pub includes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AliasBody {
    /// Scalar alias target; `None` for array items that carry no type.
    Type(Option<String>),
    /// Inline object type built from array items `elements`.
    Structured(Elements),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDef {
    pub body: AliasBody,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    /// Underlying primitive type name, e.g. `cds.String`.
    pub primitive: String,
    pub members: EnumMembers,
}

impl EnumDef {
    pub fn is_string_type(&self) -> bool {
        matches!(self.primitive.as_str(), "cds.String" | "cds.LargeString")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Action,
    Function,
}

impl ActionKind {
    /// Name prefix used for generated declarations.
    pub fn prefix(self) -> &'static str {
        match self {
            ActionKind::Action => "Action",
            ActionKind::Function => "Func",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// `None` for array parameters whose items carry no type.
    pub type_ref: Option<TypeRef>,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Returns {
    pub type_ref: Option<TypeRef>,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionFunctionDef {
    pub kind: ActionKind,
    pub params: IndexMap<String, Parameter>,
    pub returns: Option<Returns>,
}

#[derive(Debug, Clone, PartialEq)]
/// Normalized definition; the set of variants is closed.
pub enum Definition {
    Entity(EntityDef),
    TypeAlias(TypeAliasDef),
    Enum(EnumDef),
    ActionFunction(ActionFunctionDef),
}

impl Definition {
    pub fn as_entity(&self) -> Option<&EntityDef> {
        match self {
            Definition::Entity(entity) => Some(entity),
            _ => None,
        }
    }
}

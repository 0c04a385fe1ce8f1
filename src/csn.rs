//! Compiled schema (CSN) vocabulary and the definition classifier.
//!
//! Raw definitions are untyped JSON objects whose shapes overlap: a
//! structured type and an enum type differ only by the presence of `enum`.
//! [`classify`] resolves that overlap with a fixed, priority-ordered decision
//! list and returns a closed [`DefinitionKind`].

use serde_json::{Map as JsonMap, Value as JsonValue};

pub const KIND_SERVICE: &str = "service";
pub const KIND_ENTITY: &str = "entity";
pub const KIND_TYPE: &str = "type";
pub const KIND_ACTION: &str = "action";
pub const KIND_FUNCTION: &str = "function";

pub const ASSOCIATION: &str = "cds.Association";
pub const COMPOSITION: &str = "cds.Composition";

/// Managed-aspect fields that are always filled by the runtime.
pub const MANAGED_FIELDS: [&str; 4] = ["createdAt", "createdBy", "modifiedAt", "modifiedBy"];

/// Builtin type names known to the schema compiler.
///
/// Names in this list never resolve against user definitions; the ones
/// without a TypeScript mapping resolve to `unknown`.
pub const BUILTIN_TYPES: &[&str] = &[
    ASSOCIATION,
    COMPOSITION,
    "cds.UUID",
    "cds.Boolean",
    "cds.Integer",
    "cds.Integer64",
    "cds.Decimal",
    "cds.DecimalFloat",
    "cds.Double",
    "cds.Date",
    "cds.Time",
    "cds.DateTime",
    "cds.Timestamp",
    "cds.String",
    "cds.Binary",
    "cds.LargeString",
    "cds.LargeBinary",
    "User",
    "cds.hana.TINYINT",
];

const LOCALIZED_PREFIX: &str = "localized.";
const TEXTS_MARKER: &str = "_texts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Classified shape of one raw top-level definition.
pub enum DefinitionKind {
    Service,
    Entity,
    Action,
    Function,
    /// `kind: type` with a scalar `type` and neither `enum` nor `elements`.
    TypeAlias,
    /// `kind: type` without a scalar `type` but with `items`.
    ArrayTypeAlias(ItemsShape),
    /// `kind: type` without a scalar `type` but with `elements`.
    StructuredType,
    /// `kind: type` with a scalar `type` and an `enum`.
    EnumType,
    /// Any other kind (`aspect`, `context`, ...) or a `type` shape matching no rule.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Shape of the `items` of an array type alias.
pub enum ItemsShape {
    /// Items carry a scalar `type`.
    Typed,
    /// Items carry inline `elements`.
    Structured,
    /// Items carry neither; the alias renders as `unknown[]`.
    Opaque,
}

/// Classifies a raw definition.
///
/// Rules are evaluated in priority order; a later rule never sees an input
/// matched by an earlier one.
pub fn classify(raw: &JsonValue) -> DefinitionKind {
    let Some(obj) = raw.as_object() else {
        return DefinitionKind::Unsupported;
    };

    match obj.get("kind").and_then(JsonValue::as_str) {
        Some(KIND_SERVICE) => return DefinitionKind::Service,
        Some(KIND_ENTITY) => return DefinitionKind::Entity,
        Some(KIND_ACTION) => return DefinitionKind::Action,
        Some(KIND_FUNCTION) => return DefinitionKind::Function,
        Some(KIND_TYPE) => {}
        _ => return DefinitionKind::Unsupported,
    }

    let has_type = scalar_type(obj).is_some();
    let has_enum = has_key(obj, "enum");
    let has_elements = has_key(obj, "elements");

    if has_type && !has_enum && !has_elements {
        DefinitionKind::TypeAlias
    } else if !has_type && has_key(obj, "items") {
        DefinitionKind::ArrayTypeAlias(items_shape(obj))
    } else if !has_type && has_elements {
        DefinitionKind::StructuredType
    } else if has_type && has_enum {
        DefinitionKind::EnumType
    } else {
        DefinitionKind::Unsupported
    }
}

fn items_shape(obj: &JsonMap<String, JsonValue>) -> ItemsShape {
    let Some(items) = obj.get("items").and_then(JsonValue::as_object) else {
        return ItemsShape::Opaque;
    };
    if scalar_type(items).is_some() {
        ItemsShape::Typed
    } else if has_key(items, "elements") {
        ItemsShape::Structured
    } else {
        ItemsShape::Opaque
    }
}

/// Returns `true` for definitions that are never emitted: localized-text
/// shadows, the `localized.` view namespace, and association-typed aliases.
pub fn is_excluded(name: &str, raw: &JsonValue) -> bool {
    if is_localization_name(name) {
        return true;
    }
    raw.get("type").and_then(JsonValue::as_str) == Some(ASSOCIATION)
}

pub fn is_localization_name(name: &str) -> bool {
    name.contains(TEXTS_MARKER) || name.starts_with(LOCALIZED_PREFIX)
}

/// Returns `true` for elements that point at a localized-text shadow entity.
pub fn is_localized_text_field(element: &JsonMap<String, JsonValue>) -> bool {
    element
        .get("target")
        .and_then(JsonValue::as_str)
        .map(|target| target.contains(TEXTS_MARKER))
        .unwrap_or(false)
}

pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

pub fn is_managed_field(name: &str) -> bool {
    MANAGED_FIELDS.contains(&name)
}

/// Returns the scalar (string) `type` of a raw object, ignoring `{ref: [...]}` types.
pub fn scalar_type(obj: &JsonMap<String, JsonValue>) -> Option<&str> {
    obj.get("type").and_then(JsonValue::as_str)
}

/// Key presence, treating explicit `null` as absent.
pub fn has_key(obj: &JsonMap<String, JsonValue>, key: &str) -> bool {
    obj.get(key).map(|v| !v.is_null()).unwrap_or(false)
}

/// JavaScript-style truthiness for annotation flags such as `@Core.Computed`.
pub fn is_truthy(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(JsonValue::String(s)) => !s.is_empty(),
        Some(JsonValue::Array(_)) | Some(JsonValue::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{classify, is_excluded, is_truthy, DefinitionKind, ItemsShape};

    #[test]
    fn classifies_each_kind_discriminator() {
        assert_eq!(classify(&json!({"kind": "service"})), DefinitionKind::Service);
        assert_eq!(classify(&json!({"kind": "entity", "elements": {}})), DefinitionKind::Entity);
        assert_eq!(classify(&json!({"kind": "action"})), DefinitionKind::Action);
        assert_eq!(classify(&json!({"kind": "function"})), DefinitionKind::Function);
        assert_eq!(classify(&json!({"kind": "aspect"})), DefinitionKind::Unsupported);
        assert_eq!(classify(&json!("entity")), DefinitionKind::Unsupported);
    }

    #[test]
    fn classifies_type_shapes_in_priority_order() {
        assert_eq!(
            classify(&json!({"kind": "type", "type": "cds.String"})),
            DefinitionKind::TypeAlias
        );
        assert_eq!(
            classify(&json!({"kind": "type", "items": {"type": "cds.String"}})),
            DefinitionKind::ArrayTypeAlias(ItemsShape::Typed)
        );
        assert_eq!(
            classify(&json!({"kind": "type", "items": {"elements": {}}})),
            DefinitionKind::ArrayTypeAlias(ItemsShape::Structured)
        );
        assert_eq!(
            classify(&json!({"kind": "type", "items": {}})),
            DefinitionKind::ArrayTypeAlias(ItemsShape::Opaque)
        );
        assert_eq!(
            classify(&json!({"kind": "type", "elements": {"a": {"type": "cds.String"}}})),
            DefinitionKind::StructuredType
        );
        assert_eq!(
            classify(&json!({"kind": "type", "type": "cds.String", "enum": {"A": {"val": "a"}}})),
            DefinitionKind::EnumType
        );
    }

    #[test]
    fn ambiguous_shapes_resolve_to_first_matching_rule() {
        // type + enum + elements: rule 5 rejects (enum), rule 8 matches.
        assert_eq!(
            classify(&json!({
                "kind": "type",
                "type": "cds.String",
                "enum": {"A": {}},
                "elements": {"x": {"type": "cds.String"}}
            })),
            DefinitionKind::EnumType
        );
        // items + elements without type: rule 6 wins over rule 7.
        assert_eq!(
            classify(&json!({
                "kind": "type",
                "items": {"type": "cds.Integer"},
                "elements": {"x": {"type": "cds.String"}}
            })),
            DefinitionKind::ArrayTypeAlias(ItemsShape::Typed)
        );
        // type + elements without enum matches nothing.
        assert_eq!(
            classify(&json!({"kind": "type", "type": "my.Base", "elements": {}})),
            DefinitionKind::Unsupported
        );
        // explicit nulls count as absent.
        assert_eq!(
            classify(&json!({"kind": "type", "type": "cds.String", "enum": null})),
            DefinitionKind::TypeAlias
        );
    }

    #[test]
    fn excludes_localization_and_association_aliases() {
        assert!(is_excluded("Books_texts", &json!({"kind": "entity"})));
        assert!(is_excluded("localized.Books", &json!({"kind": "entity"})));
        assert!(is_excluded(
            "my.Assoc",
            &json!({"kind": "type", "type": "cds.Association"})
        ));
        assert!(!is_excluded("my.Books.texts", &json!({"kind": "entity"})));
        assert!(!is_excluded("my.Books", &json!({"kind": "entity"})));
    }

    #[test]
    fn truthiness_follows_javascript_rules() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(is_truthy(Some(&json!({"val": 0}))));
        assert!(is_truthy(Some(&json!(true))));
    }
}

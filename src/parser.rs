//! Schema parser: compiled CSN definitions to the normalized model.
//!
//! One sweep over `definitions` in document order. Services are declared
//! first so that their members are routed to them regardless of where the
//! service entry itself appears in the map.

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::ast::{
    ActionFunctionDef, ActionKind, AliasBody, Cardinality, Definition, Element, Elements,
    EntityDef, EntityKind, EnumDef, EnumMembers, EnumValue, ForeignKey, Parameter, Returns,
    TypeAliasDef, TypeRef,
};
use crate::csn::{
    classify, has_key, is_excluded, is_localized_text_field, is_managed_field, is_truthy,
    scalar_type, DefinitionKind, ItemsShape,
};
use crate::error::CdsError;
use crate::scope::{Scope, ScopeKind, ScopeTable};

type JsonObject = JsonMap<String, JsonValue>;

#[derive(Debug, Clone)]
/// Frozen result of one parse pass.
pub struct ParsedSchema {
    scopes: ScopeTable,
}

impl ParsedSchema {
    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    pub fn services(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.services()
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.namespaces()
    }

    pub fn global_definitions(&self) -> &IndexMap<String, Definition> {
        self.scopes.global().definitions()
    }

    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.scopes.definition(name)
    }
}

/// Parses compiled schema JSON text.
pub fn parse_schema_str(input: &str) -> Result<ParsedSchema, CdsError> {
    let value: JsonValue = serde_json::from_str(input)?;
    parse_schema(&value)
}

/// Parses a compiled schema (`{"definitions": {...}}`) into [`ParsedSchema`].
pub fn parse_schema(value: &JsonValue) -> Result<ParsedSchema, CdsError> {
    let root = value.as_object().ok_or_else(|| {
        CdsError::SchemaError("compiled schema must be a JSON object".to_string())
    })?;
    let definitions = root
        .get("definitions")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| {
            CdsError::SchemaError("compiled schema must contain a 'definitions' object".to_string())
        })?;

    let mut scopes = ScopeTable::new();
    for (name, raw) in definitions {
        if classify(raw) == DefinitionKind::Service && !is_excluded(name, raw) {
            scopes.declare(name, ScopeKind::Service);
        }
    }

    for (name, raw) in definitions {
        if is_excluded(name, raw) {
            log::debug!("skipping excluded definition '{}'", name);
            continue;
        }

        let kind = classify(raw);
        if kind == DefinitionKind::Service {
            continue;
        }

        let parsed = match raw.as_object() {
            Some(body) => parse_definition(name, body, kind)?,
            None => None,
        };
        let Some(definition) = parsed else {
            log::debug!("skipping unsupported definition '{}'", name);
            continue;
        };
        let owner = scopes.owner_for(name);
        scopes.insert(owner, name.clone(), definition);
    }

    Ok(ParsedSchema { scopes })
}

/// Parses one classified body; `None` for kinds that produce no definition.
fn parse_definition(
    name: &str,
    body: &JsonObject,
    kind: DefinitionKind,
) -> Result<Option<Definition>, CdsError> {
    let definition = match kind {
        DefinitionKind::Entity => Definition::Entity(parse_entity(name, body, EntityKind::Entity)?),
        DefinitionKind::StructuredType => {
            Definition::Entity(parse_entity(name, body, EntityKind::StructuredType)?)
        }
        DefinitionKind::Action => {
            Definition::ActionFunction(parse_action(name, body, ActionKind::Action)?)
        }
        DefinitionKind::Function => {
            Definition::ActionFunction(parse_action(name, body, ActionKind::Function)?)
        }
        DefinitionKind::TypeAlias => Definition::TypeAlias(TypeAliasDef {
            body: AliasBody::Type(scalar_type(body).map(str::to_string)),
            is_array: false,
        }),
        DefinitionKind::ArrayTypeAlias(shape) => {
            Definition::TypeAlias(parse_array_alias(name, body, shape)?)
        }
        DefinitionKind::EnumType => parse_enum_type(body),
        DefinitionKind::Service | DefinitionKind::Unsupported => return Ok(None),
    };
    Ok(Some(definition))
}

/// An `enum: {}` without members degrades to a plain alias of its primitive.
fn parse_enum_type(body: &JsonObject) -> Definition {
    let primitive = scalar_type(body).unwrap_or_default().to_string();
    let members = parse_enum_members(body.get("enum"));
    if members.is_empty() {
        return Definition::TypeAlias(TypeAliasDef {
            body: AliasBody::Type(Some(primitive)),
            is_array: false,
        });
    }
    Definition::Enum(EnumDef { primitive, members })
}

fn parse_entity(name: &str, body: &JsonObject, kind: EntityKind) -> Result<EntityDef, CdsError> {
    Ok(EntityDef {
        kind,
        elements: parse_elements(name, body)?,
        actions: parse_bound_actions(name, body)?,
        includes: string_list(body.get("includes")),
    })
}

fn parse_array_alias(
    name: &str,
    body: &JsonObject,
    shape: ItemsShape,
) -> Result<TypeAliasDef, CdsError> {
    let items = body.get("items").and_then(JsonValue::as_object);
    let alias_body = match (shape, items) {
        (ItemsShape::Typed, Some(items)) => AliasBody::Type(scalar_type(items).map(str::to_string)),
        (ItemsShape::Structured, Some(items)) => AliasBody::Structured(parse_elements(name, items)?),
        _ => AliasBody::Type(None),
    };
    Ok(TypeAliasDef {
        body: alias_body,
        is_array: true,
    })
}

/// Parses the `elements` of an entity, structured type or array items.
fn parse_elements(owner: &str, body: &JsonObject) -> Result<Elements, CdsError> {
    let mut out = IndexMap::new();
    let Some(raw_elements) = body.get("elements") else {
        return Ok(out);
    };
    let elements = raw_elements.as_object().ok_or_else(|| {
        CdsError::SchemaError(format!("elements of '{}' must be an object", owner))
    })?;

    for (field, raw) in elements {
        let element = raw.as_object().ok_or_else(|| {
            CdsError::SchemaError(format!("element '{}' of '{}' must be an object", field, owner))
        })?;
        if is_localized_text_field(element) {
            continue;
        }
        out.insert(field.clone(), parse_element(owner, field, element)?);
    }

    Ok(out)
}

fn parse_element(owner: &str, field: &str, element: &JsonObject) -> Result<Element, CdsError> {
    let items = element.get("items").and_then(JsonValue::as_object);
    let is_virtual = is_truthy(element.get("virtual"));
    let type_ref = parse_type_ref(element.get("type"))
        .or_else(|| items.and_then(|items| parse_type_ref(items.get("type"))));

    if type_ref.is_none() && items.is_none() && !has_key(element, "target") && !is_virtual {
        return Err(CdsError::MalformedDefinition {
            owner: owner.to_string(),
            element: field.to_string(),
        });
    }

    let can_be_null = is_truthy(element.get("@Core.Computed"))
        || is_truthy(element.get("@Core.Immutable"))
        || is_virtual
        || has_key(element, "default")
        || is_managed_field(field);

    let enum_values = Some(parse_enum_members(element.get("enum"))).filter(|m| !m.is_empty());

    Ok(Element {
        type_ref,
        target: element
            .get("target")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        cardinality: parse_cardinality(element, items.is_some()),
        can_be_null,
        keys: parse_keys(element.get("keys")),
        enum_values,
    })
}

/// `many` for array-shaped elements, else the explicit `cardinality.max`, else `one`.
fn parse_cardinality(element: &JsonObject, is_array: bool) -> Cardinality {
    if is_array {
        return Cardinality::Many;
    }
    let max = element
        .get("cardinality")
        .and_then(JsonValue::as_object)
        .and_then(|cardinality| cardinality.get("max"));
    match max {
        Some(JsonValue::String(s)) if s == "*" || s.eq_ignore_ascii_case("many") => {
            Cardinality::Many
        }
        Some(JsonValue::Number(n)) if n.as_u64().map(|n| n > 1).unwrap_or(false) => {
            Cardinality::Many
        }
        _ => Cardinality::One,
    }
}

fn parse_type_ref(value: Option<&JsonValue>) -> Option<TypeRef> {
    match value? {
        JsonValue::String(name) => Some(TypeRef::Named(name.clone())),
        JsonValue::Object(obj) => {
            let path = string_list(obj.get("ref"));
            match path.as_slice() {
                [entity, element] => Some(TypeRef::ElementRef {
                    entity: entity.clone(),
                    element: element.clone(),
                }),
                [name] => Some(TypeRef::Named(name.clone())),
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_keys(value: Option<&JsonValue>) -> Vec<ForeignKey> {
    let Some(keys) = value.and_then(JsonValue::as_array) else {
        return Vec::new();
    };
    keys.iter()
        .filter_map(|key| key.as_object())
        .map(|key| ForeignKey {
            path: string_list(key.get("ref")),
        })
        .filter(|key| !key.path.is_empty())
        .collect()
}

fn parse_enum_members(value: Option<&JsonValue>) -> EnumMembers {
    let mut out = IndexMap::new();
    let Some(entries) = value.and_then(JsonValue::as_object) else {
        return out;
    };
    for (name, entry) in entries {
        out.insert(
            name.clone(),
            EnumValue {
                val: entry.get("val").cloned(),
            },
        );
    }
    out
}

fn parse_bound_actions(
    owner: &str,
    body: &JsonObject,
) -> Result<IndexMap<String, ActionFunctionDef>, CdsError> {
    let mut out = IndexMap::new();
    let Some(actions) = body.get("actions").and_then(JsonValue::as_object) else {
        return Ok(out);
    };

    for (name, raw) in actions {
        let kind = match classify(raw) {
            DefinitionKind::Action => ActionKind::Action,
            DefinitionKind::Function => ActionKind::Function,
            _ => {
                log::debug!("skipping bound member '{}' of '{}'", name, owner);
                continue;
            }
        };
        let body = raw.as_object().ok_or_else(|| {
            CdsError::SchemaError(format!("action '{}' of '{}' must be an object", name, owner))
        })?;
        let qualified = format!("{owner}.{name}");
        out.insert(name.clone(), parse_action(&qualified, body, kind)?);
    }

    Ok(out)
}

fn parse_action(name: &str, body: &JsonObject, kind: ActionKind) -> Result<ActionFunctionDef, CdsError> {
    let mut params = IndexMap::new();
    if let Some(raw_params) = body.get("params").and_then(JsonValue::as_object) {
        for (param_name, raw) in raw_params {
            let param = raw.as_object().ok_or_else(|| {
                CdsError::SchemaError(format!(
                    "parameter '{}' of '{}' must be an object",
                    param_name, name
                ))
            })?;
            params.insert(param_name.clone(), parse_parameter(name, param_name, param)?);
        }
    }

    let returns = body
        .get("returns")
        .and_then(JsonValue::as_object)
        .map(|returns| {
            let (type_ref, is_array) = type_or_items(returns);
            Returns { type_ref, is_array }
        });

    Ok(ActionFunctionDef {
        kind,
        params,
        returns,
    })
}

fn parse_parameter(owner: &str, name: &str, param: &JsonObject) -> Result<Parameter, CdsError> {
    let (type_ref, is_array) = type_or_items(param);
    if type_ref.is_none() && !is_array {
        return Err(CdsError::MalformedDefinition {
            owner: owner.to_string(),
            element: name.to_string(),
        });
    }
    Ok(Parameter { type_ref, is_array })
}

/// Type of a parameter or return value, looking one level into `items`.
fn type_or_items(obj: &JsonObject) -> (Option<TypeRef>, bool) {
    match obj.get("items").and_then(JsonValue::as_object) {
        Some(items) => (parse_type_ref(items.get("type")), true),
        None => (parse_type_ref(obj.get("type")), false),
    }
}

fn string_list(value: Option<&JsonValue>) -> Vec<String> {
    value
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_schema;
    use crate::ast::{AliasBody, Cardinality, Definition, TypeRef};
    use crate::error::CdsError;

    #[test]
    fn parses_elements_with_defaults() {
        let parsed = parse_schema(&json!({
            "definitions": {
                "Books": {
                    "kind": "entity",
                    "elements": {
                        "ID": {"type": "cds.UUID", "key": true},
                        "tags": {"items": {"type": "cds.String"}},
                        "stock": {"type": "cds.Integer", "default": {"val": 0}}
                    }
                }
            }
        }))
        .unwrap();

        let books = parsed.global_definitions()["Books"].as_entity().unwrap();
        let id = &books.elements["ID"];
        assert_eq!(id.type_ref, Some(TypeRef::Named("cds.UUID".to_string())));
        assert_eq!(id.cardinality, Cardinality::One);
        assert!(!id.can_be_null);

        let tags = &books.elements["tags"];
        assert_eq!(tags.cardinality, Cardinality::Many);
        assert_eq!(tags.type_ref, Some(TypeRef::Named("cds.String".to_string())));

        assert!(books.elements["stock"].can_be_null);
    }

    #[test]
    fn missing_type_is_fatal_and_names_the_element() {
        let err = parse_schema(&json!({
            "definitions": {
                "my.Books": {"kind": "entity", "elements": {"broken": {}}}
            }
        }))
        .unwrap_err();

        assert!(matches!(err, CdsError::MalformedDefinition { .. }));
        let message = err.to_string();
        assert!(message.contains("'broken'"));
        assert!(message.contains("'my.Books'"));
    }

    #[test]
    fn virtual_elements_without_type_are_accepted() {
        let parsed = parse_schema(&json!({
            "definitions": {
                "Books": {"kind": "entity", "elements": {"calc": {"virtual": true}}}
            }
        }))
        .unwrap();
        let books = parsed.global_definitions()["Books"].as_entity().unwrap();
        assert!(books.elements["calc"].type_ref.is_none());
        assert!(books.elements["calc"].can_be_null);
    }

    #[test]
    fn array_type_alias_keeps_items_type() {
        let parsed = parse_schema(&json!({
            "definitions": {
                "my.Tags": {"kind": "type", "items": {"type": "cds.String"}}
            }
        }))
        .unwrap();
        let Some(Definition::TypeAlias(alias)) = parsed.definition("my.Tags") else {
            panic!("expected type alias");
        };
        assert!(alias.is_array);
        assert_eq!(alias.body, AliasBody::Type(Some("cds.String".to_string())));
    }

    #[test]
    fn enum_type_without_members_becomes_alias() {
        let parsed = parse_schema(&json!({
            "definitions": {
                "my.Genre": {"kind": "type", "type": "cds.String", "enum": {}}
            }
        }))
        .unwrap();
        let Some(Definition::TypeAlias(alias)) = parsed.definition("my.Genre") else {
            panic!("expected type alias");
        };
        assert!(!alias.is_array);
        assert_eq!(alias.body, AliasBody::Type(Some("cds.String".to_string())));
    }

    #[test]
    fn rejects_schema_without_definitions() {
        let err = parse_schema(&json!({"namespace": "x"})).unwrap_err();
        assert!(err.to_string().contains("'definitions'"));
    }
}

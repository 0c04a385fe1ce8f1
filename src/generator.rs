//! Declaration generation: one [`SourceFileDecl`] per namespace.
//!
//! Per file the order is fixed: type aliases, enums, entities (each preceded
//! by its inline enums and followed by its bound actions), unbound actions,
//! then the `Entity` and `SanitizedEntity` enums.

use std::collections::HashSet;

use serde_json::Value as JsonValue;

use crate::ast::{
    ActionFunctionDef, AliasBody, Definition, Element, Elements, EntityDef, EnumDef, EnumMembers,
    Parameter, TypeAliasDef, TypeRef,
};
use crate::config::GeneratorOptions;
use crate::declaration::{
    Declaration, EnumDecl, EnumInitializer, EnumMember, ImportDecl, ImportSpecifier,
    InterfaceDecl, NamespaceDecl, PropertySignature, SourceFileDecl, TsType, TypeAliasDecl,
};
use crate::namespace::{
    aggregate, Namespace, TypeIndex, ENTITY_ENUM_NAME, SANITIZED_ENTITY_ENUM_NAME,
};
use crate::parser::ParsedSchema;
use crate::resolve::{
    entity_identifier, inline_enum_identifier, sanitize_name, sanitized_identifier, ActionNames,
    ImportTable, TypeResolver,
};

/// Declaration trees for every generated file plus non-fatal resolution warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDeclarations {
    pub files: Vec<SourceFileDecl>,
    pub warnings: Vec<String>,
}

/// Builds the declaration trees for a parsed schema.
pub fn generate_declarations(
    parsed: &ParsedSchema,
    options: &GeneratorOptions,
) -> GeneratedDeclarations {
    let index = TypeIndex::build(parsed, &options.prefix);
    let mut files = Vec::new();
    let mut warnings = Vec::new();

    for namespace in aggregate(parsed, options.sort) {
        let local_names = namespace.local_identifiers(&options.prefix);
        let resolver = TypeResolver::new(&index, namespace.name(), local_names);
        let mut generator = DeclarationGenerator::new(resolver, options);
        let declarations = generator.generate_namespace(&namespace);
        let (imports, mut file_warnings) = generator.into_resolver().into_parts();

        log::info!(
            "generated {} declarations for '{}'",
            declarations.len(),
            display_name(namespace.name(), options)
        );
        files.push(SourceFileDecl {
            file_name: file_name_for(namespace.name(), options),
            namespace: namespace.name().to_string(),
            imports: import_decls(imports, options),
            declarations,
        });
        warnings.append(&mut file_warnings);
    }

    GeneratedDeclarations { files, warnings }
}

/// `<namespace>.ts`, or the configured global file for the global scope.
pub fn file_name_for(namespace: &str, options: &GeneratorOptions) -> String {
    format!("{}.ts", display_name(namespace, options))
}

fn display_name<'a>(namespace: &'a str, options: &'a GeneratorOptions) -> &'a str {
    if namespace.is_empty() {
        &options.global_file_name
    } else {
        namespace
    }
}

fn import_decls(imports: ImportTable, options: &GeneratorOptions) -> Vec<ImportDecl> {
    imports
        .into_iter()
        .map(|(namespace, names)| ImportDecl {
            module_specifier: format!("./{}", display_name(&namespace, options)),
            named_imports: names
                .into_iter()
                .map(|(name, local)| ImportSpecifier {
                    alias: (local != name).then_some(local),
                    name,
                })
                .collect(),
        })
        .collect()
}

/// Turns normalized definitions into declaration trees for one namespace.
pub struct DeclarationGenerator<'a, 'o> {
    resolver: TypeResolver<'a>,
    options: &'o GeneratorOptions,
}

impl<'a, 'o> DeclarationGenerator<'a, 'o> {
    pub fn new(resolver: TypeResolver<'a>, options: &'o GeneratorOptions) -> Self {
        Self { resolver, options }
    }

    pub fn into_resolver(self) -> TypeResolver<'a> {
        self.resolver
    }

    pub fn generate_namespace(&mut self, namespace: &Namespace<'_>) -> Vec<Declaration> {
        let mut out = Vec::new();
        for (name, definition) in namespace.emission_order() {
            out.extend(self.generate_definition(name, definition));
        }

        out.push(Declaration::Enum(
            self.generate_enum(ENTITY_ENUM_NAME.to_string(), &namespace.entity_enum()),
        ));
        out.push(Declaration::Enum(self.generate_enum(
            SANITIZED_ENTITY_ENUM_NAME.to_string(),
            &namespace.sanitized_entity_enum(),
        )));
        out
    }

    /// Generates the declarations for one definition, dispatching on its variant.
    pub fn generate_definition(&mut self, name: &str, definition: &Definition) -> Vec<Declaration> {
        match definition {
            Definition::Entity(entity) => self.generate_entity(name, entity),
            Definition::TypeAlias(alias) => self.generate_type_alias(name, alias),
            Definition::Enum(enum_def) => vec![Declaration::Enum(
                self.generate_enum(sanitized_identifier(name), enum_def),
            )],
            Definition::ActionFunction(action) => self.generate_action(name, action, None),
        }
    }

    fn generate_entity(&mut self, name: &str, entity: &EntityDef) -> Vec<Declaration> {
        let identifier = entity_identifier(&self.options.prefix, name);
        let mut extends = Vec::new();
        let mut inherited: HashSet<&str> = HashSet::new();

        for include in &entity.includes {
            match self.resolver.resolve_include(include) {
                Some((base, base_entity)) => {
                    extends.push(base);
                    inherited.extend(base_entity.elements.keys().map(String::as_str));
                }
                None => log::debug!("ignoring include '{}' of '{}'", include, name),
            }
        }

        let mut out = Vec::new();
        let mut properties = Vec::new();
        for (field, element) in &entity.elements {
            if inherited.contains(field.as_str()) {
                continue;
            }
            if let Some(members) = &element.enum_values {
                out.push(Declaration::Enum(self.inline_enum(name, field, element, members)));
            }
            properties.push(self.property(name, field, element));
            properties.extend(self.resolver.foreign_keys(
                field,
                element,
                &self.options.foreign_key_separator,
            ));
        }

        out.push(Declaration::Interface(InterfaceDecl {
            name: identifier.clone(),
            extends,
            properties,
        }));

        if !entity.actions.is_empty() {
            let mut declarations = Vec::new();
            for (action_name, action) in &entity.actions {
                declarations.extend(self.generate_action(action_name, action, Some(name)));
            }
            out.push(Declaration::Namespace(NamespaceDecl {
                name: format!("{identifier}.actions"),
                declarations,
            }));
        }
        out
    }

    fn generate_type_alias(&mut self, name: &str, alias: &TypeAliasDef) -> Vec<Declaration> {
        let mut out = Vec::new();
        let ty = match &alias.body {
            AliasBody::Type(Some(type_name)) => self.resolver.resolve_type_name(type_name),
            AliasBody::Type(None) => TsType::Unknown,
            AliasBody::Structured(elements) => {
                out.extend(self.inline_enums(name, elements));
                TsType::Object(self.properties(name, elements))
            }
        };
        out.push(Declaration::TypeAlias(TypeAliasDecl {
            name: sanitized_identifier(name),
            ty: ty.array_if(alias.is_array),
        }));
        out
    }

    fn generate_enum(&self, name: String, enum_def: &EnumDef) -> EnumDecl {
        EnumDecl {
            name,
            members: enum_members(&enum_def.members, enum_def.is_string_type()),
        }
    }

    fn inline_enum(
        &self,
        owner: &str,
        field: &str,
        element: &Element,
        members: &EnumMembers,
    ) -> EnumDecl {
        let is_string = matches!(
            element.type_ref.as_ref().and_then(TypeRef::named),
            Some("cds.String") | Some("cds.LargeString")
        );
        EnumDecl {
            name: inline_enum_identifier(owner, field),
            members: enum_members(members, is_string),
        }
    }

    fn inline_enums(&self, owner: &str, elements: &Elements) -> Vec<Declaration> {
        elements
            .iter()
            .filter_map(|(field, element)| {
                element.enum_values.as_ref().map(|members| {
                    Declaration::Enum(self.inline_enum(owner, field, element, members))
                })
            })
            .collect()
    }

    fn properties(&mut self, owner: &str, elements: &Elements) -> Vec<PropertySignature> {
        let mut out = Vec::new();
        for (field, element) in elements {
            out.push(self.property(owner, field, element));
            out.extend(self.resolver.foreign_keys(
                field,
                element,
                &self.options.foreign_key_separator,
            ));
        }
        out
    }

    fn property(&mut self, owner: &str, field: &str, element: &Element) -> PropertySignature {
        PropertySignature {
            name: field.to_string(),
            optional: element.can_be_null || element.is_navigation(),
            ty: self.resolver.resolve_element(owner, field, element),
        }
    }

    fn generate_action(
        &mut self,
        name: &str,
        action: &ActionFunctionDef,
        bound_owner: Option<&str>,
    ) -> Vec<Declaration> {
        let names = ActionNames::new(
            &self.options.prefix,
            action.kind.prefix(),
            name,
            bound_owner,
        );

        let mut members = vec![EnumMember {
            name: "name".to_string(),
            value: Some(EnumInitializer::String(names.short_name.clone())),
        }];
        for param in action.params.keys() {
            members.push(EnumMember {
                name: format!("param{}", sanitize_name(param)),
                value: Some(EnumInitializer::String(param.clone())),
            });
        }

        let mut out = vec![Declaration::Enum(EnumDecl {
            name: names.enum_name.clone(),
            members,
        })];

        if !action.params.is_empty() {
            let properties = action
                .params
                .iter()
                .map(|(param_name, param)| self.parameter(param_name, param))
                .collect();
            out.push(Declaration::Interface(InterfaceDecl {
                name: names.params_name.clone(),
                extends: Vec::new(),
                properties,
            }));
        }

        if let Some(returns) = &action.returns {
            let ty = self
                .resolver
                .resolve_type_ref(returns.type_ref.as_ref())
                .array_if(returns.is_array);
            out.push(Declaration::TypeAlias(TypeAliasDecl {
                name: names.return_name,
                ty,
            }));
        }
        out
    }

    fn parameter(&mut self, name: &str, param: &Parameter) -> PropertySignature {
        let ty = self
            .resolver
            .resolve_type_ref(param.type_ref.as_ref())
            .array_if(param.is_array);
        PropertySignature {
            name: name.to_string(),
            optional: false,
            ty,
        }
    }
}

/// Enum members with initializers; falsy values leave the member auto-numbered.
fn enum_members(members: &EnumMembers, is_string: bool) -> Vec<EnumMember> {
    members
        .iter()
        .map(|(name, value)| EnumMember {
            name: name.clone(),
            value: value
                .val
                .as_ref()
                .filter(|_| value.has_initializer())
                .map(|val| initializer(val, is_string)),
        })
        .collect()
}

fn initializer(value: &JsonValue, is_string: bool) -> EnumInitializer {
    let text = match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    if is_string {
        EnumInitializer::String(text)
    } else {
        EnumInitializer::Literal(text)
    }
}

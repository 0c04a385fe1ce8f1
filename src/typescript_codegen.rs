//! TypeScript source rendering for generated declaration trees.

use crate::declaration::{
    Declaration, EnumDecl, EnumInitializer, ImportDecl, InterfaceDecl, NamespaceDecl,
    PropertySignature, SourceFileDecl, TsType, TypeAliasDecl,
};

const INDENT: &str = "    ";

pub const GENERATED_HEADER: &str = concat!(
    "// Generated by cds2types.\n",
    "// WARNING: This file is generated. Do not edit manually.\n",
);

/// Renders one file: header, imports, then declarations separated by blank lines.
pub fn render_source_file(file: &SourceFileDecl) -> String {
    let mut out = String::from(GENERATED_HEADER);

    if !file.imports.is_empty() {
        out.push('\n');
        for import in &file.imports {
            out.push_str(&render_import(import));
            out.push('\n');
        }
    }

    for declaration in &file.declarations {
        out.push('\n');
        render_declaration(declaration, 0, &mut out);
    }
    out
}

fn render_import(import: &ImportDecl) -> String {
    let names: Vec<String> = import
        .named_imports
        .iter()
        .map(|specifier| match &specifier.alias {
            Some(alias) => format!("{} as {alias}", specifier.name),
            None => specifier.name.clone(),
        })
        .collect();
    format!(
        "import {{ {} }} from \"{}\";",
        names.join(", "),
        escape_string(&import.module_specifier)
    )
}

fn render_declaration(declaration: &Declaration, depth: usize, out: &mut String) {
    match declaration {
        Declaration::Interface(decl) => render_interface(decl, depth, out),
        Declaration::Enum(decl) => render_enum(decl, depth, out),
        Declaration::TypeAlias(decl) => render_type_alias(decl, depth, out),
        Declaration::Namespace(decl) => render_namespace(decl, depth, out),
    }
}

fn render_interface(decl: &InterfaceDecl, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    out.push_str(&format!("{indent}export interface {}", decl.name));
    if !decl.extends.is_empty() {
        out.push_str(&format!(" extends {}", decl.extends.join(", ")));
    }
    if decl.properties.is_empty() {
        out.push_str(" {}\n");
        return;
    }

    out.push_str(" {\n");
    for property in &decl.properties {
        out.push_str(&format!(
            "{indent}{INDENT}{};\n",
            render_property(property)
        ));
    }
    out.push_str(&format!("{indent}}}\n"));
}

fn render_enum(decl: &EnumDecl, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    out.push_str(&format!("{indent}export enum {}", decl.name));
    if decl.members.is_empty() {
        out.push_str(" {}\n");
        return;
    }

    out.push_str(" {\n");
    for member in &decl.members {
        let name = render_property_name(&member.name);
        match &member.value {
            Some(EnumInitializer::String(value)) => out.push_str(&format!(
                "{indent}{INDENT}{name} = \"{}\",\n",
                escape_string(value)
            )),
            Some(EnumInitializer::Literal(value)) => {
                out.push_str(&format!("{indent}{INDENT}{name} = {value},\n"))
            }
            None => out.push_str(&format!("{indent}{INDENT}{name},\n")),
        }
    }
    out.push_str(&format!("{indent}}}\n"));
}

fn render_type_alias(decl: &TypeAliasDecl, depth: usize, out: &mut String) {
    out.push_str(&format!(
        "{}export type {} = {};\n",
        INDENT.repeat(depth),
        decl.name,
        render_type(&decl.ty)
    ));
}

fn render_namespace(decl: &NamespaceDecl, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    out.push_str(&format!("{indent}export namespace {} {{\n", decl.name));
    for (idx, declaration) in decl.declarations.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        render_declaration(declaration, depth + 1, out);
    }
    out.push_str(&format!("{indent}}}\n"));
}

fn render_property(property: &PropertySignature) -> String {
    format!(
        "{}{}: {}",
        render_property_name(&property.name),
        if property.optional { "?" } else { "" },
        render_type(&property.ty)
    )
}

/// Renders a type expression as it appears after `:` or `=`.
pub fn render_type(ty: &TsType) -> String {
    match ty {
        TsType::Primitive(primitive) => primitive.as_str().to_string(),
        TsType::Reference(name) => name.clone(),
        TsType::Unknown => "unknown".to_string(),
        TsType::Array(inner) => format!("{}[]", render_type(inner)),
        TsType::Object(properties) if properties.is_empty() => "{}".to_string(),
        TsType::Object(properties) => {
            let body: Vec<String> = properties.iter().map(render_property).collect();
            format!("{{ {} }}", body.join("; "))
        }
    }
}

fn render_property_name(raw: &str) -> String {
    if is_valid_ts_identifier(raw) {
        raw.to_string()
    } else {
        format!("\"{}\"", escape_string(raw))
    }
}

fn is_valid_ts_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    if !(first == '_' || first == '$' || first.is_ascii_alphabetic()) {
        return false;
    }

    chars.all(|ch| ch == '_' || ch == '$' || ch.is_ascii_alphanumeric())
}

fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

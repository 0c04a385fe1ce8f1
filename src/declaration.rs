//! Output declaration trees handed to the TypeScript serializer.

#[derive(Debug, Clone, PartialEq, Eq)]
/// Resolved type expression.
pub enum TsType {
    Primitive(Primitive),
    /// Identifier of a generated declaration, local or imported.
    Reference(String),
    /// Inline object literal type.
    Object(Vec<PropertySignature>),
    Array(Box<TsType>),
    /// Sentinel for types that could not be resolved.
    Unknown,
}

impl TsType {
    pub fn array(self) -> Self {
        TsType::Array(Box::new(self))
    }

    pub fn array_if(self, is_array: bool) -> Self {
        if is_array {
            self.array()
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Date,
    Buffer,
}

impl Primitive {
    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Date => "Date",
            Primitive::Buffer => "Buffer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySignature {
    pub name: String,
    pub optional: bool,
    pub ty: TsType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Vec<String>,
    pub properties: Vec<PropertySignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumInitializer {
    /// Emitted quoted.
    String(String),
    /// Emitted verbatim.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    /// `None` leaves the member auto-numbered.
    pub value: Option<EnumInitializer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAliasDecl {
    pub name: String,
    pub ty: TsType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// `export namespace <name> { ... }`; used to group bound actions.
pub struct NamespaceDecl {
    pub name: String,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Interface(InterfaceDecl),
    Enum(EnumDecl),
    TypeAlias(TypeAliasDecl),
    Namespace(NamespaceDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Interface(decl) => &decl.name,
            Declaration::Enum(decl) => &decl.name,
            Declaration::TypeAlias(decl) => &decl.name,
            Declaration::Namespace(decl) => &decl.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Module path relative to the importing file, e.g. `./sap.common`.
    pub module_specifier: String,
    pub named_imports: Vec<ImportSpecifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One generated file: the declarations of a single namespace.
pub struct SourceFileDecl {
    pub file_name: String,
    /// Namespace name; empty for the global scope.
    pub namespace: String,
    pub imports: Vec<ImportDecl>,
    pub declarations: Vec<Declaration>,
}

impl SourceFileDecl {
    pub fn find(&self, name: &str) -> Option<&Declaration> {
        find_declaration(&self.declarations, name)
    }
}

fn find_declaration<'a>(declarations: &'a [Declaration], name: &str) -> Option<&'a Declaration> {
    for declaration in declarations {
        if declaration.name() == name {
            return Some(declaration);
        }
        if let Declaration::Namespace(namespace) = declaration {
            if let Some(found) = find_declaration(&namespace.declarations, name) {
                return Some(found);
            }
        }
    }
    None
}

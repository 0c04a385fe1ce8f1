pub mod ast;
pub mod compiler;
pub mod config;
pub mod csn;
pub mod declaration;
pub mod error;
pub mod formatter;
pub mod generator;
pub mod namespace;
pub mod parser;
pub mod resolve;
pub mod scope;
pub mod typescript_codegen;
pub mod writer;

use std::path::Path;

use serde_json::Value as JsonValue;

use compiler::{compile_schema, SchemaCompiler};
pub use config::GeneratorOptions;
pub use error::CdsError;
pub use generator::{generate_declarations, GeneratedDeclarations};
pub use parser::{parse_schema, parse_schema_str, ParsedSchema};
use typescript_codegen::render_source_file;

/// One rendered TypeScript file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_name: String,
    /// Namespace name; empty for the global scope.
    pub namespace: String,
    pub content: String,
}

/// Rendered files plus non-fatal resolution warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    pub files: Vec<GeneratedFile>,
    pub warnings: Vec<String>,
}

impl GeneratedOutput {
    pub fn file(&self, file_name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|file| file.file_name == file_name)
    }
}

/// Renders declaration trees to TypeScript source text.
pub fn render_declarations(declarations: &GeneratedDeclarations) -> GeneratedOutput {
    GeneratedOutput {
        files: declarations
            .files
            .iter()
            .map(|file| GeneratedFile {
                file_name: file.file_name.clone(),
                namespace: file.namespace.clone(),
                content: render_source_file(file),
            })
            .collect(),
        warnings: declarations.warnings.clone(),
    }
}

/// Generates TypeScript declarations from compiled schema JSON.
pub fn generate_typescript(
    schema: &JsonValue,
    options: &GeneratorOptions,
) -> Result<GeneratedOutput, CdsError> {
    let parsed = parse_schema(schema)?;
    Ok(render_declarations(&generate_declarations(&parsed, options)))
}

/// Generates TypeScript declarations from compiled schema JSON text.
pub fn generate_typescript_str(
    input: &str,
    options: &GeneratorOptions,
) -> Result<GeneratedOutput, CdsError> {
    let schema: JsonValue = serde_json::from_str(input)?;
    generate_typescript(&schema, options)
}

/// Compiles the model at `path` and generates TypeScript declarations.
///
/// Returns the compiled schema alongside the output so callers can dump it.
pub fn generate_typescript_from_path(
    path: impl AsRef<Path>,
    compiler: &dyn SchemaCompiler,
    options: &GeneratorOptions,
) -> Result<(JsonValue, GeneratedOutput), CdsError> {
    let schema = compile_schema(path.as_ref(), compiler)?;
    let output = generate_typescript(&schema, options)?;
    Ok((schema, output))
}

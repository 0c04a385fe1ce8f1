//! Schema compiler collaborators: turn a model path into compiled CSN JSON.

use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value as JsonValue;

use crate::error::CdsError;

/// External compiler producing the compiled schema JSON consumed by the parser.
pub trait SchemaCompiler {
    /// Loads the model at `path` into a compiler-specific tree.
    fn load(&self, path: &Path) -> Result<JsonValue, CdsError>;

    /// Compiles a loaded tree to schema JSON with a top-level `definitions` map.
    fn compile_to_json(&self, tree: JsonValue) -> Result<JsonValue, CdsError>;
}

/// Reads an already compiled schema from a `.json` file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecompiledJson;

impl SchemaCompiler for PrecompiledJson {
    fn load(&self, path: &Path) -> Result<JsonValue, CdsError> {
        let text = fs::read_to_string(path).map_err(|err| {
            CdsError::CompilerError(format!("failed to read '{}': {err}", path.display()))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn compile_to_json(&self, tree: JsonValue) -> Result<JsonValue, CdsError> {
        ensure_definitions(tree)
    }
}

/// Runs the `cds` command line (`cds compile <path> --to json`).
#[derive(Debug, Clone)]
pub struct CdsCommandCompiler {
    program: String,
}

impl Default for CdsCommandCompiler {
    fn default() -> Self {
        Self::new("cds")
    }
}

impl CdsCommandCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SchemaCompiler for CdsCommandCompiler {
    fn load(&self, path: &Path) -> Result<JsonValue, CdsError> {
        log::info!("compiling '{}' with '{}'", path.display(), self.program);
        let output = Command::new(&self.program)
            .arg("compile")
            .arg(path)
            .arg("--to")
            .arg("json")
            .output()
            .map_err(|err| {
                CdsError::CompilerError(format!(
                    "failed to run '{}'; make sure it is installed and on PATH: {err}",
                    self.program
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CdsError::CompilerError(format!(
                "'{} compile {}' failed: {}",
                self.program,
                path.display(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim())
            .map_err(|err| CdsError::CompilerError(format!("invalid compiler output: {err}")))
    }

    fn compile_to_json(&self, tree: JsonValue) -> Result<JsonValue, CdsError> {
        ensure_definitions(tree)
    }
}

/// Picks [`PrecompiledJson`] for `.json` inputs and the `cds` command otherwise.
pub fn compiler_for(path: &Path) -> Box<dyn SchemaCompiler> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        Box::new(PrecompiledJson)
    } else {
        Box::new(CdsCommandCompiler::default())
    }
}

/// Loads and compiles the model at `path`.
pub fn compile_schema(path: &Path, compiler: &dyn SchemaCompiler) -> Result<JsonValue, CdsError> {
    let tree = compiler.load(path)?;
    compiler.compile_to_json(tree)
}

fn ensure_definitions(tree: JsonValue) -> Result<JsonValue, CdsError> {
    match tree.get("definitions") {
        Some(JsonValue::Object(_)) => Ok(tree),
        _ => Err(CdsError::CompilerError(
            "compiled schema has no 'definitions' object".to_string(),
        )),
    }
}

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CdsError;

/// Generation options shared by the library API and the command line.
///
/// A JSON config file may set any subset of the fields (camelCase keys);
/// command-line flags override what it sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneratorOptions {
    /// Prefix for interface names of entities, structured types and action parameters.
    pub prefix: String,
    /// Sort namespaces and definitions by name for stable output.
    pub sort: bool,
    /// Run generated files through the external formatter.
    pub format: bool,
    /// Also write the compiled schema JSON next to the output.
    pub dump_json: bool,
    /// File stem for definitions outside any namespace or service.
    pub global_file_name: String,
    /// Joins an association name and a target key into a foreign-key field name.
    pub foreign_key_separator: String,
    /// Formatter program and arguments; generated text is piped through stdin.
    pub formatter_command: Vec<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            sort: false,
            format: false,
            dump_json: false,
            global_file_name: "cds".to_string(),
            foreign_key_separator: "_".to_string(),
            formatter_command: vec![
                "prettier".to_string(),
                "--parser".to_string(),
                "typescript".to_string(),
            ],
        }
    }
}

impl GeneratorOptions {
    pub fn from_json_str(input: &str) -> Result<Self, CdsError> {
        let options: GeneratorOptions = serde_json::from_str(input)
            .map_err(|err| CdsError::ConfigError(format!("invalid config: {err}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CdsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            CdsError::ConfigError(format!("failed to read config '{}': {err}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), CdsError> {
        if self.global_file_name.trim().is_empty() {
            return Err(CdsError::ConfigError(
                "globalFileName must not be empty".to_string(),
            ));
        }
        if self.format && self.formatter_command.is_empty() {
            return Err(CdsError::ConfigError(
                "formatterCommand must name a program when formatting is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

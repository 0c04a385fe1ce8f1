use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use crate::error::CdsError;
use crate::formatter::Formatter;
use crate::GeneratedOutput;

/// Formats and writes every generated file into `dir`, returning the written paths.
///
/// `dir` must already exist; it is never created.
pub fn write_output(
    dir: &Path,
    output: &GeneratedOutput,
    formatter: &dyn Formatter,
) -> Result<Vec<PathBuf>, CdsError> {
    if !dir.is_dir() {
        return Err(CdsError::OutputError(format!(
            "'{}' is not an existing directory",
            dir.display()
        )));
    }

    let mut written = Vec::new();
    for file in &output.files {
        let text = formatter.format(&file.content)?;
        let path = dir.join(&file.file_name);
        fs::write(&path, text).map_err(|err| {
            CdsError::OutputError(format!("failed to write '{}': {err}", path.display()))
        })?;
        log::info!("wrote '{}'", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Writes the compiled schema as pretty-printed JSON.
pub fn dump_json(path: &Path, schema: &JsonValue) -> Result<(), CdsError> {
    let text = serde_json::to_string_pretty(schema)?;
    fs::write(path, text).map_err(|err| {
        CdsError::OutputError(format!("failed to write '{}': {err}", path.display()))
    })?;
    log::info!("wrote compiled schema to '{}'", path.display());
    Ok(())
}

/// `<output>.json`, the location of the compiled schema dump for an output directory.
pub fn json_dump_path(output: &Path) -> PathBuf {
    let mut raw = output.as_os_str().to_os_string();
    raw.push(".json");
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::json_dump_path;

    #[test]
    fn dump_path_appends_json_extension() {
        assert_eq!(json_dump_path(Path::new("out/types")), Path::new("out/types.json"));
    }
}

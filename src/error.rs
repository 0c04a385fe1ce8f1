//! Error definitions for all `cds2types` stages.

use thiserror::Error;

#[derive(Debug, Error)]
/// Top-level error type returned by public APIs.
pub enum CdsError {
    /// An element or parameter has neither a scalar type nor array items and is not virtual.
    #[error("malformed definition: element '{element}' of '{owner}' has neither a type nor array items")]
    MalformedDefinition { owner: String, element: String },
    /// Compiled schema shape failure (missing `definitions`, non-object bodies).
    #[error("schema error: {0}")]
    SchemaError(String),
    /// External schema compiler failure.
    #[error("compiler error: {0}")]
    CompilerError(String),
    /// External formatter failure.
    #[error("format error: {0}")]
    FormatError(String),
    /// Output location is missing or not a directory.
    #[error("output error: {0}")]
    OutputError(String),
    /// Configuration file could not be read or decoded.
    #[error("config error: {0}")]
    ConfigError(String),
    /// JSON decoding or encoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Filesystem I/O error from callers that propagate I/O.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

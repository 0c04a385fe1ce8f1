use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::CdsError;

/// Post-processes generated source text.
pub trait Formatter {
    fn format(&self, text: &str) -> Result<String, CdsError>;
}

/// Returns the text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, text: &str) -> Result<String, CdsError> {
        Ok(text.to_string())
    }
}

/// Pipes the text through an external program's stdin and reads stdout.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds a formatter from `[program, args...]`.
    pub fn from_command(command: &[String]) -> Result<Self, CdsError> {
        let Some((program, args)) = command.split_first() else {
            return Err(CdsError::FormatError("formatter command is empty".to_string()));
        };
        Ok(Self::new(program.clone(), args.to_vec()))
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, text: &str) -> Result<String, CdsError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                CdsError::FormatError(format!("failed to run '{}': {err}", self.program))
            })?;

        let Some(mut stdin) = child.stdin.take() else {
            return Err(CdsError::FormatError(format!(
                "failed to open stdin of '{}'",
                self.program
            )));
        };
        stdin.write_all(text.as_bytes())?;
        drop(stdin);

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CdsError::FormatError(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout).map_err(|err| {
            CdsError::FormatError(format!("'{}' produced invalid UTF-8: {err}", self.program))
        })
    }
}

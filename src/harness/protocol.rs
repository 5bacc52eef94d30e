//! Line protocol spoken by the application under test.
//!
//! Request: `import_module("<name>")`. Reply: the bare module name on
//! success, or a line starting with `* import failed` on failure.

use crate::harness::errors::HarnessError;

/// Prefix of a failed-import reply.
pub const IMPORT_FAILED_PREFIX: &str = "* import failed";

/// Result of one import request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported,
    /// The full failure line as sent by the app
    Failed(String),
}

impl ImportOutcome {
    /// Classify a reply to an import of `expected`.
    ///
    /// Anything other than the module name or a failure line is a protocol
    /// violation.
    pub fn parse(expected: &str, line: &str) -> Result<Self, HarnessError> {
        let line = line.trim();
        if line == expected {
            Ok(ImportOutcome::Imported)
        } else if line.starts_with(IMPORT_FAILED_PREFIX) {
            Ok(ImportOutcome::Failed(line.to_string()))
        } else {
            Err(HarnessError::ProtocolViolation {
                expected: expected.to_string(),
                got: line.to_string(),
            })
        }
    }

    pub fn is_imported(&self) -> bool {
        matches!(self, ImportOutcome::Imported)
    }
}

/// Dotted module path made of identifier characters.
fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

/// Build the request line (without trailing newline) for importing `name`.
pub fn import_request(name: &str) -> Result<String, HarnessError> {
    if !is_valid_module_name(name) {
        return Err(HarnessError::InvalidModuleName {
            name: name.to_string(),
        });
    }
    Ok(format!("import_module(\"{}\")", name))
}

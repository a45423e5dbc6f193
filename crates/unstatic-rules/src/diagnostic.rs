//! Diagnostic types produced by rules

use serde::Serialize;
use unstatic_core::{NodeHandle, Span, UnitId};

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - must be fixed
    Error,
    /// Warning - should be reviewed
    Warning,
    /// Info - a suggestion
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single finding of a rule in one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The rule that reported this diagnostic (e.g., "unstatic_class")
    pub rule: &'static str,
    /// Stable diagnostic identifier (e.g., "UnstaticClass")
    pub id: &'static str,
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Unit the diagnostic was found in
    pub unit: UnitId,
    /// Byte range of the reported token
    pub span: Span,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Handle to the declaration a fix would rewrite
    pub target: NodeHandle,
}

impl Diagnostic {
    /// Location formatted as `unit:line:column`
    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.unit, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Info.to_string(), "info");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Error.to_string(), "error");
    }
}

use std::fmt;

use crate::dsl::error::{ParseError, Pos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DiagnosticSeverity {
    Warning,
    /// The text did not parse; reported by [`crate::analyze_script`] instead
    /// of an error so analysis never fails.
    Error,
}

/// A structured static-analysis finding with its source position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(at: Pos, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            line: at.line,
            column: at.column,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == DiagnosticSeverity::Warning
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            line: err.line,
            column: err.column,
            message: err.message.clone(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}: {}", self.line, self.column, self.message)
    }
}

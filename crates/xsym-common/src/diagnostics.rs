use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    /// A signature refers to a type whose assembly is referenced but does not define it.
    pub const TYPE_DEFINED_IN_UNREFERENCED_ASSEMBLY: u32 = 12;
    /// More than one NoPia resolution assembly defines the canonical type.
    pub const NO_PIA_AMBIGUOUS_CANONICAL_TYPE: u32 = 1758;
    /// No NoPia resolution assembly defines the canonical type.
    pub const NO_PIA_MISSING_CANONICAL_TYPE: u32 = 1748;
    /// A type forwarder chain loops back on itself.
    pub const CYCLE_IN_TYPE_FORWARDER: u32 = 731;
}

pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes};

    pub const TYPE_DEFINED_IN_UNREFERENCED_ASSEMBLY: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::TYPE_DEFINED_IN_UNREFERENCED_ASSEMBLY,
        category: DiagnosticCategory::Error,
        message: "The type '{0}' is defined in an assembly that is not referenced. You must add a reference to assembly '{1}'.",
    };

    pub const NO_PIA_AMBIGUOUS_CANONICAL_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::NO_PIA_AMBIGUOUS_CANONICAL_TYPE,
        category: DiagnosticCategory::Error,
        message: "Cannot embed interop type '{0}' found in both assembly '{1}' and '{2}'.",
    };

    pub const NO_PIA_MISSING_CANONICAL_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::NO_PIA_MISSING_CANONICAL_TYPE,
        category: DiagnosticCategory::Error,
        message: "Cannot find the interop type that matches the embedded interop type '{0}'. Are you missing an assembly reference?",
    };

    pub const CYCLE_IN_TYPE_FORWARDER: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::CYCLE_IN_TYPE_FORWARDER,
        category: DiagnosticCategory::Error,
        message: "The type forwarder for type '{0}' in assembly '{1}' causes a cycle",
    };

    pub const ALL: &[DiagnosticMessage] = &[
        TYPE_DEFINED_IN_UNREFERENCED_ASSEMBLY,
        NO_PIA_AMBIGUOUS_CANONICAL_TYPE,
        NO_PIA_MISSING_CANONICAL_TYPE,
        CYCLE_IN_TYPE_FORWARDER,
    ];
}

/// A diagnostic attached to a symbol rather than to a source position.
///
/// Use-site diagnostics are reported by whoever binds against the symbol, so
/// they carry no file or span of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            message_text: message.into(),
            code,
        }
    }

    pub fn from_message(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            category: message.category,
            code: message.code,
            message_text: format_message(message.message, args),
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self.category, DiagnosticCategory::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XS{:04}: {}", self.code, self.message_text)
    }
}

pub fn get_message_template(code: u32) -> Option<&'static str> {
    diagnostic_messages::ALL
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;

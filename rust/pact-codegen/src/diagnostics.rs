//! Non-fatal problems found while compiling a contract.

use std::fmt;

use pact_contract::{OperationDeclaration, SourceLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Generation continued unchanged, or with a documented fallback.
    Warning,
    /// The offending operation was skipped; its siblings still generate.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Operation the problem is attributed to, if any.
    pub operation: Option<String>,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}", self.severity)?;
        if let Some(operation) = &self.operation {
            write!(f, " in `{operation}`")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Diagnostics collected over one compilation pass, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            severity = %diagnostic.severity,
            operation = diagnostic.operation.as_deref().unwrap_or(""),
            "{}",
            diagnostic.message
        );
        self.items.push(diagnostic);
    }

    /// Report a problem with `operation` that causes it to be skipped.
    pub fn skip(&mut self, operation: &OperationDeclaration, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            operation: Some(operation.name().to_string()),
            location: operation.location().cloned(),
        });
    }

    pub fn warn_operation(&mut self, operation: &OperationDeclaration, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            operation: Some(operation.name().to_string()),
            location: operation.location().cloned(),
        });
    }

    /// A contract-level warning not tied to any operation.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            operation: None,
            location: None,
        });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    /// Diagnostics attributed to the operation called `name`.
    pub fn for_operation<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.items
            .iter()
            .filter(move |d| d.operation.as_deref() == Some(name))
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use pact_contract::{OperationDeclaration, SourceLocation, TypeRef};

    use super::*;

    #[test]
    fn skip_is_an_error_with_location() {
        let op = OperationDeclaration::one_way("Notify")
            .returns(TypeRef::I32)
            .at(SourceLocation::new("svc.rs", 3, 1))
            .build();

        let mut diagnostics = Diagnostics::new();
        diagnostics.skip(&op, "one-way operations cannot return a value");
        diagnostics.warn("no serializer configured");

        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.errors().count(), 1);
        assert_eq!(diagnostics.warnings().count(), 1);
        assert_eq!(
            diagnostics.iter().next().map(ToString::to_string).as_deref(),
            Some("svc.rs:3:1: error in `Notify`: one-way operations cannot return a value")
        );
        assert_eq!(diagnostics.for_operation("Notify").count(), 1);
    }
}

//! Recoverable conditions reported during compilation and walking.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// A condition found while compiling templates or walking markup.
///
/// None of these abort compilation. `MarkupDecode` is the only one that stops
/// a walk early; everything assembled before it is still returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("Invalid configuration for collection '{collection}': {message}")]
    ConfigParse { collection: String, message: String },

    #[error("Unsupported value type for field '{field}' in collection '{collection}': {found}")]
    UnsupportedTemplateValueType {
        collection: String,
        field: String,
        found: String,
    },

    #[error("Malformed modifier '{token}' in symbol {symbol}")]
    MalformedModifier { symbol: String, token: String },

    #[error(
        "Symbol path '{path}' is bound twice in collection '{collection}'; \
         keeping '{kept}', dropping '{dropped}'"
    )]
    DuplicateSymbol {
        collection: String,
        path: String,
        kept: String,
        dropped: String,
    },

    #[error("Markup decode error at byte {position}: {message}")]
    MarkupDecode { position: u64, message: String },

    #[error("No template configured for collection '{0}'")]
    UnknownCollection(String),

    #[error("Object '{path}' has no parent collection")]
    MissingParentCollection { path: String },

    #[error("Unhandled hierarchy depth {depth} at '{path}'")]
    UnhandledHierarchyDepth { path: String, depth: usize },

    #[error("Value for '{path}' has no object to be written into")]
    MissingInstance { path: String },

    #[error("Closing tag '{0}' has no matching open element")]
    UnbalancedClose(String),

    #[error("Unhandled modifier '{key}={value}' for '{path}' (available: {available})")]
    UnknownModifier {
        path: String,
        key: String,
        value: String,
        available: String,
    },

    #[error("Modifier '{modifier}' failed for '{path}': {message}")]
    ModifierFailed {
        path: String,
        modifier: String,
        message: String,
    },

    #[error("Failed to parse date '{input}' for '{path}': {message}")]
    DateParse {
        path: String,
        input: String,
        message: String,
    },
}

impl Diagnostic {
    /// Severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::DuplicateSymbol { .. }
            | Diagnostic::UnknownCollection(_)
            | Diagnostic::UnhandledHierarchyDepth { .. }
            | Diagnostic::UnknownModifier { .. }
            | Diagnostic::MissingInstance { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Each one is also logged as it is recorded.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        debug!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any diagnostic has [`Severity::Error`].
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A value together with the diagnostics produced while building it.
#[derive(Debug)]
pub struct Reported<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Reported<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_severity_split() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::UnknownCollection("Visits".to_string()));
        assert!(!diagnostics.has_errors());

        diagnostics.push(Diagnostic::MarkupDecode {
            position: 12,
            message: "unexpected end".to_string(),
        });
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.errors().count(), 1);
        assert_eq!(diagnostics.warnings().count(), 1);
    }

    #[test]
    fn test_display_messages() {
        let d = Diagnostic::UnknownModifier {
            path: "Patients.Patient.Age".to_string(),
            key: "transform".to_string(),
            value: "daysElapsed".to_string(),
            available: "upper, yearsElapsed".to_string(),
        };
        assert_eq!(
            d.to_string(),
            "Unhandled modifier 'transform=daysElapsed' for 'Patients.Patient.Age' \
             (available: upper, yearsElapsed)"
        );
    }

    #[test]
    fn test_push_stays_below_info() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut diagnostics = Diagnostics::new();
            diagnostics.push(Diagnostic::UnknownCollection("Visits".to_string()));
            diagnostics.push(Diagnostic::MarkupDecode {
                position: 3,
                message: "unexpected end".to_string(),
            });
        });

        assert!(capture.0.lock().unwrap().is_empty());
    }
}

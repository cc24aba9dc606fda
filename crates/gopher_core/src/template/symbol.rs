//! Placeholder symbols embedded in template fields.
//!
//! A symbol looks like `<Patients.Patient.DateOfBirth transform=yearsElapsed>`:
//! a dot-joined hierarchy path followed by zero or more `key=value` modifiers.

use std::collections::BTreeMap;
use std::fmt;

/// Modifier key/value pairs attached to a symbol, ordered by key.
pub type Modifiers = BTreeMap<String, String>;

/// A parsed placeholder symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Dot-joined hierarchy path, e.g. `Patients.Patient.ID`.
    pub path: String,
    /// Modifiers declared on the symbol.
    pub modifiers: Modifiers,
    /// The symbol exactly as written in the template, brackets included.
    pub literal: String,
}

/// Result of parsing a symbol, with any modifier tokens that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSymbol {
    pub symbol: Symbol,
    pub malformed: Vec<String>,
}

impl Symbol {
    /// Parse a symbol from its literal text.
    ///
    /// The surrounding brackets are optional. Returns `None` when the symbol
    /// carries no path at all (e.g. `<  >`).
    pub fn parse(literal: &str) -> Option<ParsedSymbol> {
        let inner = literal.strip_prefix('<').unwrap_or(literal);
        let inner = inner.strip_suffix('>').unwrap_or(inner);

        let mut tokens = inner.split_whitespace();
        let path = tokens.next()?.to_string();

        let mut modifiers = Modifiers::new();
        let mut malformed = Vec::new();
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    modifiers.insert(key.to_string(), value.to_string());
                }
                _ => malformed.push(token.to_string()),
            }
        }

        Some(ParsedSymbol {
            symbol: Symbol {
                path,
                modifiers,
                literal: literal.to_string(),
            },
            malformed,
        })
    }

    pub fn has_modifiers(&self) -> bool {
        !self.modifiers.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

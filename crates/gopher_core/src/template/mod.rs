//! Compiled configuration templates.
//!
//! A configuration document declares, per collection, one object template
//! whose string fields embed placeholder [`Symbol`]s. Compiling it yields a
//! [`CompiledConfig`] that the walker uses as a read-only lookup table.

pub mod compiler;
pub mod symbol;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub use compiler::TemplateCompiler;
pub use symbol::{Modifiers, ParsedSymbol, Symbol};

/// A single template field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    /// Text with zero or more embedded symbols.
    Text(String),
    /// Numeric literal, passed through verbatim.
    Number(serde_json::Number),
}

impl TemplateValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TemplateValue::Text(s) => Some(s),
            TemplateValue::Number(_) => None,
        }
    }

    /// The string form scanned for symbols.
    pub fn scan_text(&self) -> String {
        match self {
            TemplateValue::Text(s) => s.clone(),
            TemplateValue::Number(n) => n.to_string(),
        }
    }
}

/// The object shape declared for one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectTemplate {
    fields: BTreeMap<String, TemplateValue>,
}

impl ObjectTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: TemplateValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&TemplateValue> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut TemplateValue> {
        self.fields.get_mut(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TemplateValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Where a symbol path is substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolBinding {
    /// Template field containing the symbol.
    pub field: String,
    /// Literal symbol text replaced in that field.
    pub literal: String,
}

/// How a symbol path that appears in more than one field is indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The field processed last is kept.
    #[default]
    LastWins,
    /// The field processed first is kept.
    FirstWins,
}

/// Template and lookup indices for one collection.
#[derive(Debug, Clone, Default)]
pub struct CompiledCollection {
    pub name: String,
    pub template: ObjectTemplate,
    symbols: HashMap<String, SymbolBinding>,
    modifiers: HashMap<String, Modifiers>,
}

impl CompiledCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Field binding for a fully-qualified path.
    pub fn symbol(&self, path: &str) -> Option<&SymbolBinding> {
        self.symbols.get(path)
    }

    /// Modifiers declared for a fully-qualified path.
    pub fn modifiers(&self, path: &str) -> Option<&Modifiers> {
        self.modifiers.get(path)
    }

    /// Number of indexed symbol paths.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(|s| s.as_str())
    }

    pub(crate) fn bind(&mut self, symbol: Symbol, field: &str) {
        self.symbols.insert(
            symbol.path.clone(),
            SymbolBinding {
                field: field.to_string(),
                literal: symbol.literal,
            },
        );
        self.modifiers.insert(symbol.path, symbol.modifiers);
    }
}

/// Compiled templates for every configured collection.
#[derive(Debug, Clone, Default)]
pub struct CompiledConfig {
    collections: HashMap<String, CompiledCollection>,
}

impl CompiledConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: CompiledCollection) {
        self.collections.insert(collection.name.clone(), collection);
    }

    pub fn get(&self, name: &str) -> Option<&CompiledCollection> {
        self.collections.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Names of all compiled collections.
    pub fn names(&self) -> Vec<&str> {
        self.collections.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

//! Compilation of configuration documents into lookup indices.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{CompiledCollection, CompiledConfig, DuplicatePolicy, Symbol, TemplateValue};
use crate::diagnostics::{Diagnostic, Diagnostics, Reported};

/// Compiles configuration documents into [`CompiledConfig`]s.
pub struct TemplateCompiler {
    symbol_pattern: Regex,
    duplicate_policy: DuplicatePolicy,
}

impl Default for TemplateCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCompiler {
    /// Create a new template compiler.
    pub fn new() -> Self {
        Self {
            // Match <path key=value ...> symbols
            symbol_pattern: Regex::new(r"<[A-Za-z0-9.=\s]+>").expect("symbol pattern is valid"),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Compile a whole configuration document.
    ///
    /// The document maps each collection name to a one-element array holding
    /// that collection's object template. A broken collection is reported and
    /// skipped; the others still compile.
    pub fn compile(&self, document: &Value) -> Reported<CompiledConfig> {
        let mut config = CompiledConfig::new();
        let mut diagnostics = Diagnostics::new();

        let Some(collections) = document.as_object() else {
            diagnostics.push(Diagnostic::ConfigParse {
                collection: String::new(),
                message: format!("expected an object at the root, found {}", kind_of(document)),
            });
            return Reported::new(config, diagnostics);
        };

        for (name, value) in collections {
            if let Some(collection) = self.compile_collection(name, value, &mut diagnostics) {
                debug!(
                    "Compiled collection {} ({} fields, {} symbols)",
                    name,
                    collection.template.len(),
                    collection.symbol_count()
                );
                config.insert(collection);
            }
        }

        Reported::new(config, diagnostics)
    }

    /// Compile the template declared for a single collection.
    pub fn compile_collection(
        &self,
        name: &str,
        value: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Option<CompiledCollection> {
        let template = match value {
            Value::Array(items) => match items.as_slice() {
                [] => {
                    diagnostics.push(config_error(name, "template array is empty"));
                    return None;
                }
                [first, rest @ ..] => {
                    if !rest.is_empty() {
                        diagnostics.push(config_error(
                            name,
                            format!(
                                "expected one template, found {}; using the first",
                                items.len()
                            ),
                        ));
                    }
                    match first.as_object() {
                        Some(object) => object,
                        None => {
                            diagnostics.push(config_error(
                                name,
                                format!("expected an object template, found {}", kind_of(first)),
                            ));
                            return None;
                        }
                    }
                }
            },
            other => {
                diagnostics.push(config_error(
                    name,
                    format!("expected an array, found {}", kind_of(other)),
                ));
                return None;
            }
        };

        let mut collection = CompiledCollection::new(name);

        for (field, raw) in template {
            let value = match raw {
                Value::String(s) => TemplateValue::Text(s.clone()),
                Value::Number(n) => TemplateValue::Number(n.clone()),
                other => {
                    diagnostics.push(Diagnostic::UnsupportedTemplateValueType {
                        collection: name.to_string(),
                        field: field.clone(),
                        found: kind_of(other).to_string(),
                    });
                    continue;
                }
            };

            for symbol in self.scan(&value.scan_text(), diagnostics) {
                self.index_symbol(&mut collection, symbol, field, diagnostics);
            }

            collection.template.insert(field.clone(), value);
        }

        Some(collection)
    }

    /// Find every symbol embedded in `text`.
    pub fn scan(&self, text: &str, diagnostics: &mut Diagnostics) -> Vec<Symbol> {
        self.symbol_pattern
            .find_iter(text)
            .filter_map(|m| Symbol::parse(m.as_str()))
            .map(|parsed| {
                for token in parsed.malformed {
                    diagnostics.push(Diagnostic::MalformedModifier {
                        symbol: parsed.symbol.literal.clone(),
                        token,
                    });
                }
                parsed.symbol
            })
            .collect()
    }

    fn index_symbol(
        &self,
        collection: &mut CompiledCollection,
        symbol: Symbol,
        field: &str,
        diagnostics: &mut Diagnostics,
    ) {
        if let Some(existing) = collection.symbol(&symbol.path) {
            // The same symbol repeated verbatim in one field binds once.
            if existing.field == field && existing.literal == symbol.literal {
                return;
            }
            // Within one field the literals tell the two bindings apart.
            let (earlier, later) = if existing.field == field {
                (existing.literal.clone(), symbol.literal.clone())
            } else {
                (existing.field.clone(), field.to_string())
            };
            let (kept, dropped) = match self.duplicate_policy {
                DuplicatePolicy::LastWins => (later, earlier),
                DuplicatePolicy::FirstWins => (earlier, later),
            };
            diagnostics.push(Diagnostic::DuplicateSymbol {
                collection: collection.name.clone(),
                path: symbol.path.clone(),
                kept,
                dropped,
            });
            if self.duplicate_policy == DuplicatePolicy::FirstWins {
                return;
            }
        }
        collection.bind(symbol, field);
    }
}

fn config_error(collection: &str, message: impl Into<String>) -> Diagnostic {
    Diagnostic::ConfigParse {
        collection: collection.to_string(),
        message: message.into(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

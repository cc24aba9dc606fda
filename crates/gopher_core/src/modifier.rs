//! Named value transforms applied to raw markup values before substitution.
//!
//! A symbol selects a modifier through its `transform` key, e.g.
//! `<Patients.Patient.DateOfBirth transform=yearsElapsed>`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use thiserror::Error;
use tracing::debug;

/// Symbol modifier key that names the transform to apply.
pub const TRANSFORM_KEY: &str = "transform";

/// Result type alias for modifier operations.
pub type ModifierResult<T> = Result<T, ModifierError>;

/// Errors a modifier can return.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModifierError {
    #[error("Failed to parse date '{input}': {message}")]
    DateParse { input: String, message: String },

    #[error("{0}")]
    Invalid(String),
}

/// Ambient values a modifier may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierContext {
    /// The date treated as "today" by date-relative modifiers.
    pub today: NaiveDate,
}

impl ModifierContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Context anchored at the local current date.
    pub fn now() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl Default for ModifierContext {
    fn default() -> Self {
        Self::now()
    }
}

/// A pure transform from raw text to replacement text.
pub trait Modifier: Send + Sync {
    /// Name used in `transform=<name>`.
    fn name(&self) -> &str;

    /// Transform `raw` into the value written into the output.
    fn apply(&self, raw: &str, context: &ModifierContext) -> ModifierResult<String>;
}

struct FnModifier<F> {
    name: String,
    f: F,
}

impl<F> Modifier for FnModifier<F>
where
    F: Fn(&str, &ModifierContext) -> ModifierResult<String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, raw: &str, context: &ModifierContext) -> ModifierResult<String> {
        (self.f)(raw, context)
    }
}

/// Number of whole years between an ISO date and today.
///
/// One year is subtracted while today's ordinal day is still before the
/// date's ordinal day.
pub struct YearsElapsed;

impl YearsElapsed {
    pub fn years_since(date: NaiveDate, today: NaiveDate) -> i32 {
        let mut years = today.year() - date.year();
        if today.ordinal() < date.ordinal() {
            years -= 1;
        }
        years
    }
}

impl Modifier for YearsElapsed {
    fn name(&self) -> &str {
        "yearsElapsed"
    }

    fn apply(&self, raw: &str, context: &ModifierContext) -> ModifierResult<String> {
        let input = raw.trim();
        let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|e| {
            ModifierError::DateParse {
                input: input.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self::years_since(date, context.today).to_string())
    }
}

/// A registry of named modifiers.
#[derive(Default)]
pub struct ModifierRegistry {
    modifiers: HashMap<String, Arc<dyn Modifier>>,
}

impl ModifierRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            modifiers: HashMap::new(),
        }
    }

    /// Create a registry with every built-in modifier registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(YearsElapsed));
        registry.register_fn("upper", |raw, _| Ok(raw.to_uppercase()));
        registry.register_fn("lower", |raw, _| Ok(raw.to_lowercase()));
        registry.register_fn("trim", |raw, _| Ok(raw.trim().to_string()));
        registry.register_fn("snakeCase", |raw, _| Ok(to_snake_case(raw.trim())));
        registry.register_fn("pascalCase", |raw, _| Ok(to_pascal_case(raw.trim())));
        registry.register_fn("kebabCase", |raw, _| Ok(to_kebab_case(raw.trim())));
        registry
    }

    /// Register a modifier under its `name()`.
    ///
    /// A modifier already registered under the same name is replaced.
    pub fn register(&mut self, modifier: Arc<dyn Modifier>) {
        let name = modifier.name().to_string();
        debug!("Registering modifier: {}", name);
        self.modifiers.insert(name, modifier);
    }

    /// Register a closure as a modifier.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, &ModifierContext) -> ModifierResult<String> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnModifier { name: name.into(), f }));
    }

    /// Registered modifier names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modifiers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Apply the named modifier, or `None` when no such modifier exists.
    pub fn apply(
        &self,
        name: &str,
        raw: &str,
        context: &ModifierContext,
    ) -> Option<ModifierResult<String>> {
        self.modifiers.get(name).map(|m| m.apply(raw, context))
    }
}

impl std::fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &self.modifiers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else if c == '-' || c == ' ' {
            result.push('_');
        } else {
            result.push(c);
        }
    }
    result
}

fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

fn to_kebab_case(s: &str) -> String {
    to_snake_case(s).replace('_', "-")
}

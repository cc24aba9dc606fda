//! Conversion options.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConvertError, ConvertResult};
use crate::modifier::ModifierContext;
use crate::template::DuplicatePolicy;

/// Options controlling compilation and walking.
///
/// Can be built in code or loaded from a TOML, JSON or YAML file:
///
/// ```toml
/// reference_date = "2025-01-01"
/// max_depth = 3
/// reset_on_reopen = false
/// duplicate_policy = "first-wins"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Date used as "today" by date-relative modifiers. Defaults to the local date.
    pub reference_date: Option<NaiveDate>,
    /// Deepest element nesting that is resolved. Unlimited when unset.
    pub max_depth: Option<usize>,
    /// Empty a collection's objects when its element opens again.
    pub reset_on_reopen: bool,
    /// Which field keeps a symbol path used by several fields.
    pub duplicate_policy: DuplicatePolicy,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn reset_on_reopen(mut self, reset: bool) -> Self {
        self.reset_on_reopen = reset;
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Context handed to modifiers.
    pub fn modifier_context(&self) -> ModifierContext {
        self.reference_date
            .map(ModifierContext::new)
            .unwrap_or_else(ModifierContext::now)
    }

    /// Load options from a file, picking the format from its extension.
    pub fn load(path: &Path) -> ConvertResult<Self> {
        debug!("Loading options from {:?}", path);
        let content = fs::read_to_string(path).map_err(|source| ConvertError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let options: ConvertOptions = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };
        Ok(options)
    }
}

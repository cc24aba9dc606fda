//! End-to-end conversion: compile a configuration, walk the markup.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::diagnostics::Reported;
use crate::error::{ConvertError, ConvertResult};
use crate::markup::{DecodeError, MarkupEvent, MarkupReader};
use crate::modifier::ModifierRegistry;
use crate::options::ConvertOptions;
use crate::output::OutputAssembly;
use crate::template::{CompiledConfig, TemplateCompiler};
use crate::walker::HierarchyWalker;

/// Format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Guess the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Parse configuration text into a JSON value.
pub fn parse_config(text: &str, format: ConfigFormat) -> ConvertResult<Value> {
    let value: Value = match format {
        ConfigFormat::Json => serde_json::from_str(text)?,
        ConfigFormat::Yaml => serde_yaml::from_str(text)?,
    };
    Ok(value)
}

/// Read and parse a configuration file.
pub fn load_config(path: &Path) -> ConvertResult<Value> {
    let text = read(path)?;
    parse_config(&text, ConfigFormat::from_path(path))
}

fn read(path: &Path) -> ConvertResult<String> {
    fs::read_to_string(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs conversions with a fixed set of options and modifiers.
pub struct Converter {
    compiler: TemplateCompiler,
    modifiers: ModifierRegistry,
    options: ConvertOptions,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl Converter {
    /// Create a converter with the built-in modifiers.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            compiler: TemplateCompiler::new().with_duplicate_policy(options.duplicate_policy),
            modifiers: ModifierRegistry::builtin(),
            options,
        }
    }

    pub fn with_modifiers(mut self, modifiers: ModifierRegistry) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Registry used to resolve `transform=` modifiers.
    pub fn modifiers_mut(&mut self) -> &mut ModifierRegistry {
        &mut self.modifiers
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Compile a parsed configuration document.
    pub fn compile(&self, document: &Value) -> Reported<CompiledConfig> {
        self.compiler.compile(document)
    }

    /// Walk an event sequence against an already compiled configuration.
    pub fn walk<I>(&self, config: &CompiledConfig, events: I) -> Reported<OutputAssembly>
    where
        I: IntoIterator<Item = Result<MarkupEvent, DecodeError>>,
    {
        HierarchyWalker::new(config, &self.modifiers, &self.options).walk(events)
    }

    /// Convert XML text using a parsed configuration document.
    ///
    /// Compilation diagnostics come first, followed by walk diagnostics.
    pub fn convert(&self, document: &Value, xml: &str) -> Reported<OutputAssembly> {
        let compiled = self.compile(document);
        let walked = self.walk(&compiled.value, MarkupReader::new(xml));

        let mut diagnostics = compiled.diagnostics;
        diagnostics.extend(walked.diagnostics);
        info!(
            "Converted {} objects in {} collections ({} diagnostics)",
            walked.value.object_count(),
            walked.value.len(),
            diagnostics.len()
        );
        Reported::new(walked.value, diagnostics)
    }

    /// Convert XML text using configuration text.
    pub fn convert_str(
        &self,
        config: &str,
        format: ConfigFormat,
        xml: &str,
    ) -> ConvertResult<Reported<OutputAssembly>> {
        let document = parse_config(config, format)?;
        Ok(self.convert(&document, xml))
    }

    /// Convert an XML file using a configuration file.
    pub fn convert_files(
        &self,
        input: &Path,
        config: &Path,
    ) -> ConvertResult<Reported<OutputAssembly>> {
        info!("Processing {:?} using {:?}", input, config);
        let document = load_config(config)?;
        let xml = read(input)?;
        Ok(self.convert(&document, &xml))
    }
}

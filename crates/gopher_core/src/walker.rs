//! Single-pass walk over markup events that fills in template copies.
//!
//! The walker keeps a stack of open elements. The first element names the
//! collection, the second opens a new object copied from that collection's
//! template, and every deeper text node or attribute is looked up by its
//! dot-joined path and substituted into the object its instance frame points at.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::diagnostics::{Diagnostic, Diagnostics, Reported};
use crate::markup::{is_whitespace, Attribute, DecodeError, MarkupEvent};
use crate::modifier::{ModifierContext, ModifierError, ModifierRegistry, TRANSFORM_KEY};
use crate::options::ConvertOptions;
use crate::output::{AssembledObject, InstanceRef, OutputAssembly};
use crate::template::{CompiledConfig, Modifiers};

const COLLECTION_DEPTH: usize = 1;
const INSTANCE_DEPTH: usize = 2;

#[derive(Debug)]
struct Frame {
    name: String,
    instance: Option<InstanceRef>,
    suppressed: bool,
}

/// Walks markup events against a compiled configuration.
pub struct HierarchyWalker<'c> {
    config: &'c CompiledConfig,
    modifiers: &'c ModifierRegistry,
    context: ModifierContext,
    max_depth: Option<usize>,
    reset_on_reopen: bool,
    frames: Vec<Frame>,
    output: OutputAssembly,
    diagnostics: Diagnostics,
    unknown_collections: HashSet<String>,
    halted: bool,
}

impl<'c> HierarchyWalker<'c> {
    pub fn new(
        config: &'c CompiledConfig,
        modifiers: &'c ModifierRegistry,
        options: &ConvertOptions,
    ) -> Self {
        Self {
            config,
            modifiers,
            context: options.modifier_context(),
            max_depth: options.max_depth,
            reset_on_reopen: options.reset_on_reopen,
            frames: Vec::new(),
            output: OutputAssembly::new(),
            diagnostics: Diagnostics::new(),
            unknown_collections: HashSet::new(),
            halted: false,
        }
    }

    /// Consume a whole event sequence.
    ///
    /// A decode error ends the walk; everything assembled before it is kept.
    pub fn walk<I>(mut self, events: I) -> Reported<OutputAssembly>
    where
        I: IntoIterator<Item = Result<MarkupEvent, DecodeError>>,
    {
        for event in events {
            match event {
                Ok(event) => self.feed(event),
                Err(error) => {
                    self.fail(error);
                    break;
                }
            }
        }
        self.finish()
    }

    /// Process a single event.
    pub fn feed(&mut self, event: MarkupEvent) {
        if self.halted {
            return;
        }
        match event {
            MarkupEvent::Open { name, attributes } => self.open(name, &attributes),
            MarkupEvent::Close { name } => self.close(&name),
            MarkupEvent::Text(content) => self.text(&content),
            MarkupEvent::Ignorable => {}
        }
    }

    /// Record a decode error and stop accepting events.
    pub fn fail(&mut self, error: DecodeError) {
        self.diagnostics.push(Diagnostic::MarkupDecode {
            position: error.position,
            message: error.message,
        });
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Dot-joined names of the open elements.
    pub fn path(&self) -> String {
        self.frames
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn output(&self) -> &OutputAssembly {
        &self.output
    }

    pub fn finish(self) -> Reported<OutputAssembly> {
        debug!(
            "Walk finished: {} collections, {} objects, {} diagnostics",
            self.output.len(),
            self.output.object_count(),
            self.diagnostics.len()
        );
        Reported::new(self.output, self.diagnostics)
    }

    fn open(&mut self, name: String, attributes: &[Attribute]) {
        let depth = self.frames.len() + 1;
        let (instance, parent_suppressed) = self
            .frames
            .last()
            .map(|f| (f.instance, f.suppressed))
            .unwrap_or((None, false));

        self.frames.push(Frame {
            name,
            instance,
            suppressed: parent_suppressed,
        });

        if !parent_suppressed && self.max_depth.is_some_and(|max| depth > max) {
            let path = self.path();
            self.diagnostics
                .push(Diagnostic::UnhandledHierarchyDepth { path, depth });
            if let Some(frame) = self.frames.last_mut() {
                frame.suppressed = true;
            }
        }

        if self.frames.last().is_some_and(|f| f.suppressed) {
            trace!("Skipping suppressed element at depth {}", depth);
            return;
        }

        match depth {
            COLLECTION_DEPTH => self.open_collection(),
            INSTANCE_DEPTH => self.open_instance(),
            _ => {}
        }

        if attributes.is_empty() {
            return;
        }
        let base = self.path();
        for attribute in attributes {
            let path = format!("{}.{}", base, attribute.name);
            self.resolve(&path, &attribute.value);
        }
    }

    fn open_collection(&mut self) {
        let name = self.frames[0].name.clone();
        self.output.open_collection(&name, self.reset_on_reopen);

        if !self.config.contains(&name) && self.unknown_collections.insert(name.clone()) {
            self.diagnostics.push(Diagnostic::UnknownCollection(name));
        }
    }

    fn open_instance(&mut self) {
        let config = self.config;
        let collection = self.frames[0].name.clone();

        // Only hit when the collection frame was pushed without being opened.
        let Some(index) = self.output.collection_index(&collection) else {
            let path = self.path();
            self.diagnostics
                .push(Diagnostic::MissingParentCollection { path });
            return;
        };
        // Reported once when the collection opened.
        let Some(compiled) = config.get(&collection) else {
            return;
        };

        let instance = self
            .output
            .append(index, AssembledObject::from_template(&compiled.template));
        trace!("Opened object {:?} in {}", instance, collection);
        if let Some(frame) = self.frames.last_mut() {
            frame.instance = instance;
        }
    }

    fn close(&mut self, name: &str) {
        match self.frames.pop() {
            Some(frame) if frame.name == name => {}
            Some(frame) => {
                debug!("Closing '{}' while '{}' is open", name, frame.name);
                self.diagnostics.push(Diagnostic::UnbalancedClose(name.to_string()));
            }
            None => self.diagnostics.push(Diagnostic::UnbalancedClose(name.to_string())),
        }
    }

    fn text(&mut self, content: &str) {
        if is_whitespace(content) {
            return;
        }
        match self.frames.last() {
            Some(frame) if !frame.suppressed => {}
            _ => return,
        }
        let path = self.path();
        self.resolve(&path, content);
    }

    /// Resolve a raw value observed at `path` into the current object.
    ///
    /// Text and attribute values both go through here.
    fn resolve(&mut self, path: &str, raw: &str) {
        let config = self.config;
        let Some(compiled) = self.frames.first().and_then(|f| config.get(&f.name)) else {
            return;
        };
        let Some(binding) = compiled.symbol(path) else {
            return;
        };
        let Some(instance) = self.frames.last().and_then(|f| f.instance) else {
            self.diagnostics.push(Diagnostic::MissingInstance {
                path: path.to_string(),
            });
            return;
        };

        let value = match compiled.modifiers(path) {
            Some(modifiers) if !modifiers.is_empty() => {
                match self.apply_modifiers(path, raw, modifiers) {
                    Some(value) => value,
                    None => return,
                }
            }
            _ => raw.to_string(),
        };

        let Some(object) = self.output.instance_mut(instance) else {
            return;
        };
        if object.substitute(&binding.field, &binding.literal, &value) {
            trace!("Resolved {} into field {}", path, binding.field);
        } else {
            debug!("Symbol {} already resolved in field {}", binding.literal, binding.field);
        }
    }

    /// Run the value through every declared modifier, in key order.
    ///
    /// Returns `None` when a modifier fails; the symbol is then left as is.
    fn apply_modifiers(&mut self, path: &str, raw: &str, modifiers: &Modifiers) -> Option<String> {
        let mut value = raw.to_string();

        for (key, name) in modifiers {
            if key != TRANSFORM_KEY {
                let diagnostic = self.unknown_modifier(path, key, name);
                self.diagnostics.push(diagnostic);
                continue;
            }

            match self.modifiers.apply(name, &value, &self.context) {
                Some(Ok(transformed)) => value = transformed,
                Some(Err(ModifierError::DateParse { input, message })) => {
                    self.diagnostics.push(Diagnostic::DateParse {
                        path: path.to_string(),
                        input,
                        message,
                    });
                    return None;
                }
                Some(Err(error)) => {
                    self.diagnostics.push(Diagnostic::ModifierFailed {
                        path: path.to_string(),
                        modifier: name.clone(),
                        message: error.to_string(),
                    });
                    return None;
                }
                None => {
                    let diagnostic = self.unknown_modifier(path, key, name);
                    self.diagnostics.push(diagnostic);
                }
            }
        }

        Some(value)
    }

    fn unknown_modifier(&self, path: &str, key: &str, value: &str) -> Diagnostic {
        Diagnostic::UnknownModifier {
            path: path.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            available: self.modifiers.names().join(", "),
        }
    }
}

//! Assembled output objects, grouped per collection in document order.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::template::{ObjectTemplate, TemplateValue};

/// One output object: a copy of a collection template being filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssembledObject {
    fields: ObjectTemplate,
}

impl AssembledObject {
    pub fn from_template(template: &ObjectTemplate) -> Self {
        Self {
            fields: template.clone(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&TemplateValue> {
        self.fields.get(field)
    }

    /// Text of a field, if it is a text field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(TemplateValue::as_text)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &TemplateValue)> {
        self.fields.iter()
    }

    /// Replace the first occurrence of `literal` in a text field.
    ///
    /// Returns `false` when the field is missing, numeric, or no longer
    /// contains the literal.
    pub fn substitute(&mut self, field: &str, literal: &str, replacement: &str) -> bool {
        match self.fields.get_mut(field) {
            Some(TemplateValue::Text(text)) if text.contains(literal) => {
                *text = text.replacen(literal, replacement, 1);
                true
            }
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Location of an object inside an [`OutputAssembly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceRef {
    pub collection: usize,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Collection {
    name: String,
    objects: Vec<AssembledObject>,
}

/// Output objects per collection name.
///
/// Collections are kept in the order they first appear in the markup, and
/// objects within a collection in the order their elements open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputAssembly {
    collections: Vec<Collection>,
    positions: HashMap<String, usize>,
}

impl OutputAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a collection exists, returning its index.
    ///
    /// With `reset` set, an existing collection is emptied.
    pub fn open_collection(&mut self, name: &str, reset: bool) -> usize {
        if let Some(&position) = self.positions.get(name) {
            if reset {
                self.collections[position].objects.clear();
            }
            return position;
        }

        let position = self.collections.len();
        self.collections.push(Collection {
            name: name.to_string(),
            objects: Vec::new(),
        });
        self.positions.insert(name.to_string(), position);
        position
    }

    pub fn collection_index(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Append an object to a collection.
    pub fn append(&mut self, collection: usize, object: AssembledObject) -> Option<InstanceRef> {
        let objects = &mut self.collections.get_mut(collection)?.objects;
        objects.push(object);
        Some(InstanceRef {
            collection,
            index: objects.len() - 1,
        })
    }

    pub fn instance(&self, at: InstanceRef) -> Option<&AssembledObject> {
        self.collections.get(at.collection)?.objects.get(at.index)
    }

    pub fn instance_mut(&mut self, at: InstanceRef) -> Option<&mut AssembledObject> {
        self.collections
            .get_mut(at.collection)?
            .objects
            .get_mut(at.index)
    }

    /// Objects assembled for a collection.
    pub fn get(&self, name: &str) -> Option<&[AssembledObject]> {
        self.positions
            .get(name)
            .map(|&p| self.collections[p].objects.as_slice())
    }

    /// Collection names in first-seen order.
    pub fn names(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AssembledObject])> {
        self.collections
            .iter()
            .map(|c| (c.name.as_str(), c.objects.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Total number of objects across all collections.
    pub fn object_count(&self) -> usize {
        self.collections.iter().map(|c| c.objects.len()).sum()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Render as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for OutputAssembly {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.collections.len()))?;
        for collection in &self.collections {
            map.serialize_entry(&collection.name, &collection.objects)?;
        }
        map.end()
    }
}

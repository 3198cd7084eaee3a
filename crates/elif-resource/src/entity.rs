//! Entity abstraction - how the renderer reads objects it did not load
//!
//! The renderer never queries storage. Root objects hand out their related
//! objects through named accessors, and each object reports its own entity
//! type (the key used to find its representer) and identifier.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An object that can be rendered by a [`crate::Representer`]
pub trait Entity: Send + Sync {
    /// Entity type, used as the representer registry key
    fn entity_type(&self) -> &str;

    /// Identifier emitted in identifier fields and used for cycle detection
    fn identifier(&self) -> Value;

    /// Read a plain attribute; `None` when the entity has no such attribute
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Read related object(s); `None` when no accessor with this name exists
    fn related(&self, accessor: &str) -> Option<Related>;
}

/// Related object(s) read off an entity through an accessor
#[derive(Clone)]
pub enum Related {
    /// Singular association; `None` when no related object is present
    One(Option<Arc<dyn Entity>>),
    /// Collection association in its natural order
    Many(Vec<Arc<dyn Entity>>),
}

impl Related {
    /// Returns true if this holds a collection
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Number of related objects present
    pub fn len(&self) -> usize {
        match self {
            Self::One(Some(_)) => 1,
            Self::One(None) => 0,
            Self::Many(items) => items.len(),
        }
    }

    /// Returns true if no related object is present
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Related {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(Some(entity)) => f
                .debug_tuple("One")
                .field(&format_args!("{}#{}", entity.entity_type(), entity.identifier()))
                .finish(),
            Self::One(None) => f.write_str("One(None)"),
            Self::Many(items) => f
                .debug_list()
                .entries(
                    items
                        .iter()
                        .map(|e| format!("{}#{}", e.entity_type(), e.identifier())),
                )
                .finish(),
        }
    }
}

/// In-memory entity backed by a JSON attribute map
///
/// Useful for tests, fixtures, and adapting rows that were already loaded
/// into plain maps.
#[derive(Clone)]
pub struct Record {
    entity_type: String,
    id: Value,
    attributes: Map<String, Value>,
    relations: HashMap<String, Related>,
}

impl Record {
    /// Create a record with the given type and identifier
    pub fn new(entity_type: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            attributes: Map::new(),
            relations: HashMap::new(),
        }
    }

    /// Set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set a singular relation to a present object
    pub fn with_one(mut self, accessor: impl Into<String>, related: Arc<dyn Entity>) -> Self {
        self.relations
            .insert(accessor.into(), Related::One(Some(related)));
        self
    }

    /// Set a singular relation with no related object
    pub fn with_none(mut self, accessor: impl Into<String>) -> Self {
        self.relations.insert(accessor.into(), Related::One(None));
        self
    }

    /// Set a collection relation
    pub fn with_many(mut self, accessor: impl Into<String>, related: Vec<Arc<dyn Entity>>) -> Self {
        self.relations.insert(accessor.into(), Related::Many(related));
        self
    }

    /// Wrap into a shared trait object
    pub fn into_shared(self) -> Arc<dyn Entity> {
        Arc::new(self)
    }
}

impl Entity for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn identifier(&self) -> Value {
        self.id.clone()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match self.attributes.get(name) {
            Some(value) => Some(value.clone()),
            None if name == "id" => Some(self.id.clone()),
            None => None,
        }
    }

    fn related(&self, accessor: &str) -> Option<Related> {
        self.relations.get(accessor).cloned()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut accessors: Vec<&String> = self.relations.keys().collect();
        accessors.sort();
        f.debug_struct("Record")
            .field("entity_type", &self.entity_type)
            .field("id", &self.id)
            .field("attributes", &self.attributes)
            .field("relations", &accessors)
            .finish()
    }
}

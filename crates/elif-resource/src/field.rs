//! Field descriptors - the ordered output fields of a representer
//!
//! Every output key a representer can emit is an explicit descriptor with an
//! optional activation predicate and a getter. Plain properties and the
//! computed association fields installed by [`crate::installer`] are treated
//! the same way during emission.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::ResourceResult;
use crate::reflection::ConditionContext;
use crate::scope::{RenderFrame, RenderScope};

/// Everything a field sees while one object is being rendered
#[derive(Clone, Copy)]
pub struct FieldContext<'a> {
    pub entity: &'a dyn Entity,
    pub scope: &'a RenderScope<'a>,
    pub frame: &'a RenderFrame<'a>,
}

impl<'a> FieldContext<'a> {
    /// Context handed to an association's condition predicates
    pub fn condition_context<'s>(&'s self, association: &'s str) -> ConditionContext<'s> {
        ConditionContext {
            entity: self.entity,
            representer: self.frame.representer(),
            association,
            depth: self.frame.depth(),
        }
    }
}

/// Decides whether a field is emitted for the current object
pub type Activation = Arc<dyn Fn(&FieldContext<'_>) -> ResourceResult<bool> + Send + Sync>;

/// Produces a field's value; `None` omits the key from the output
pub type Getter = Arc<dyn Fn(&FieldContext<'_>) -> ResourceResult<Option<Value>> + Send + Sync>;

/// Where a field's value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// Entity attribute
    Property,
    /// Value computed by a user supplied getter
    Computed,
    /// Full representation of the named association
    AssociationFull(String),
    /// Identifier(s) of the named association
    AssociationIdentifier(String),
}

impl FieldSource {
    /// Association name, for association fields
    pub fn association(&self) -> Option<&str> {
        match self {
            Self::AssociationFull(name) | Self::AssociationIdentifier(name) => Some(name),
            Self::Property | Self::Computed => None,
        }
    }
}

/// One named output field
#[derive(Clone)]
pub struct FieldDescriptor {
    key: String,
    source: FieldSource,
    activation: Option<Activation>,
    getter: Getter,
}

impl FieldDescriptor {
    pub fn new<F>(key: impl Into<String>, source: FieldSource, getter: F) -> Self
    where
        F: Fn(&FieldContext<'_>) -> ResourceResult<Option<Value>> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            source,
            activation: None,
            getter: Arc::new(getter),
        }
    }

    /// Gate the field behind an activation predicate
    pub fn with_activation<F>(mut self, activation: F) -> Self
    where
        F: Fn(&FieldContext<'_>) -> ResourceResult<bool> + Send + Sync + 'static,
    {
        self.activation = Some(Arc::new(activation));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> &FieldSource {
        &self.source
    }

    /// Fields without an activation predicate are always active
    pub fn is_active(&self, ctx: &FieldContext<'_>) -> ResourceResult<bool> {
        match &self.activation {
            Some(activation) => activation(ctx),
            None => Ok(true),
        }
    }

    pub fn value(&self, ctx: &FieldContext<'_>) -> ResourceResult<Option<Value>> {
        (self.getter)(ctx)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("key", &self.key)
            .field("source", &self.source)
            .field("conditional", &self.activation.is_some())
            .finish()
    }
}

/// Ordered list of output fields; keys are unique
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: Vec<FieldDescriptor>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing in place any field with the same key
    pub fn upsert(&mut self, field: FieldDescriptor) {
        match self.fields.iter().position(|f| f.key == field.key) {
            Some(index) => self.fields[index] = field,
            None => self.fields.push(field),
        }
    }

    /// Swap every field installed for an association with `replacement`
    ///
    /// The replacement takes the slot of the first field previously installed
    /// for the association, or goes to the end on first declaration.
    pub fn replace_association(&mut self, association: &str, replacement: Vec<FieldDescriptor>) {
        let slot = self
            .fields
            .iter()
            .position(|f| f.source.association() == Some(association));
        self.fields
            .retain(|f| f.source.association() != Some(association));

        let replacement_keys: Vec<String> = replacement.iter().map(|f| f.key.clone()).collect();
        self.fields
            .retain(|f| !replacement_keys.contains(&f.key));

        let slot = slot.map_or(self.fields.len(), |index| index.min(self.fields.len()));
        self.fields.splice(slot..slot, replacement);
    }

    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Fields installed for an association, in order
    pub fn for_association(&self, association: &str) -> Vec<&FieldDescriptor> {
        self.fields
            .iter()
            .filter(|f| f.source.association() == Some(association))
            .collect()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

//! Representers - declarative JSON shapes for one entity type
//!
//! ```
//! use elif_resource::{AssociationOptions, Representer};
//!
//! let posts = Representer::new("Post")
//!     .property("id")
//!     .property("title")
//!     .belongs_to("author", AssociationOptions::new().expose_identifier(true))?
//!     .has_many("comments", AssociationOptions::new().expose_identifier(true))?;
//!
//! assert_eq!(
//!     posts.fields().keys(),
//!     vec!["id", "title", "author", "author_id", "comments", "comment_ids"]
//! );
//! # Ok::<(), elif_resource::ResourceError>(())
//! ```

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::ResourceResult;
use crate::field::{FieldContext, FieldDescriptor, FieldSet, FieldSource};
use crate::installer;
use crate::logging::LOG_TARGET;
use crate::options::UserOptions;
use crate::reflection::{AssociationKind, AssociationOptions, Reflection};
use crate::registry::AssociationRegistry;
use crate::scope::{RenderFrame, RenderScope};

/// Output definition for one entity type
pub struct Representer {
    entity_type: String,
    fields: FieldSet,
    associations: AssociationRegistry,
}

impl Representer {
    /// Create an empty representer for `entity_type`
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: FieldSet::new(),
            associations: AssociationRegistry::new(),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn associations(&self) -> &AssociationRegistry {
        &self.associations
    }

    pub fn reflection(&self, name: &str) -> Option<&Arc<Reflection>> {
        self.associations.get(name)
    }

    /// Emit an entity attribute under its own name
    pub fn property(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.property_as(name.clone(), name)
    }

    /// Emit an entity attribute under a different key
    pub fn property_as(mut self, key: impl Into<String>, attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        self.fields.upsert(FieldDescriptor::new(
            key,
            FieldSource::Property,
            move |ctx| Ok(ctx.entity.attribute(&attribute)),
        ));
        self
    }

    /// Emit a value computed from the entity and the request's options
    pub fn computed<F>(mut self, key: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&dyn Entity, &UserOptions) -> ResourceResult<Value> + Send + Sync + 'static,
    {
        self.fields.upsert(FieldDescriptor::new(
            key,
            FieldSource::Computed,
            move |ctx| getter(ctx.entity, ctx.scope.options()).map(Some),
        ));
        self
    }

    /// Declare an association; `options.kind` must be set
    ///
    /// Declaring a name again replaces the earlier declaration and its fields.
    pub fn association(
        mut self,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ResourceResult<Self> {
        let reflection = Arc::new(Reflection::new(self.entity_type.clone(), name, options)?);

        if let Some(previous) = self.associations.register(reflection.clone()) {
            tracing::debug!(
                target: LOG_TARGET,
                representer = %self.entity_type,
                association = previous.name(),
                "association redeclared, replacing previous declaration"
            );
        }
        installer::install(&mut self.fields, reflection.clone());

        tracing::debug!(
            target: LOG_TARGET,
            representer = %self.entity_type,
            association = reflection.name(),
            kind = %reflection.kind(),
            expose_identifier = reflection.exposes_identifier(),
            "declared association"
        );

        Ok(self)
    }

    pub fn belongs_to(
        self,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ResourceResult<Self> {
        self.association(name, options.with_kind(AssociationKind::BelongsTo))
    }

    pub fn has_one(
        self,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ResourceResult<Self> {
        self.association(name, options.with_kind(AssociationKind::HasOne))
    }

    pub fn has_many(
        self,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ResourceResult<Self> {
        self.association(name, options.with_kind(AssociationKind::HasMany))
    }

    pub fn has_and_belongs_to_many(
        self,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ResourceResult<Self> {
        self.association(name, options.with_kind(AssociationKind::HasAndBelongsToMany))
    }

    /// Emit every active field of `entity`, in declaration order
    pub fn render(
        &self,
        entity: &dyn Entity,
        scope: &RenderScope<'_>,
        frame: &RenderFrame<'_>,
    ) -> ResourceResult<Map<String, Value>> {
        let ctx = FieldContext {
            entity,
            scope,
            frame,
        };

        let mut output = Map::new();
        for field in self.fields.iter() {
            if !field.is_active(&ctx)? {
                continue;
            }
            if let Some(value) = field.value(&ctx)? {
                output.insert(field.key().to_string(), value);
            }
        }
        Ok(output)
    }
}

impl fmt::Debug for Representer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Representer")
            .field("entity_type", &self.entity_type)
            .field("fields", &self.fields.keys())
            .field("associations", &self.associations.names())
            .finish()
    }
}

//! Binding - resolves one association of one object into an output value

use serde_json::Value;

use crate::entity::{Entity, Related};
use crate::error::{ResourceError, ResourceResult};
use crate::field::FieldContext;
use crate::logging::LOG_TARGET;
use crate::pagination::paginate;
use crate::reflection::Reflection;

/// Per-evaluation resolution of a [`Reflection`] against the object being rendered
pub struct Binding<'r, 'c> {
    reflection: &'r Reflection,
    ctx: &'r FieldContext<'c>,
}

impl<'r, 'c> Binding<'r, 'c> {
    pub fn new(reflection: &'r Reflection, ctx: &'r FieldContext<'c>) -> Self {
        Self { reflection, ctx }
    }

    /// Full representation of the related object(s)
    ///
    /// Returns `None` for an absent singular association so the key is
    /// omitted from the output rather than rendered as null.
    pub fn represent(&self) -> ResourceResult<Option<Value>> {
        match self.resolve()? {
            Related::One(None) => Ok(None),
            Related::One(Some(related)) => self.render_related(related.as_ref()).map(Some),
            Related::Many(items) => {
                let retained = match self.ctx.scope.options().page_for(self.reflection.name()) {
                    Some(page) => {
                        let per_page = self
                            .reflection
                            .per_page()
                            .unwrap_or(self.ctx.scope.config().per_page);
                        tracing::debug!(
                            target: LOG_TARGET,
                            association = self.reflection.name(),
                            page,
                            per_page,
                            total = items.len(),
                            "paginating nested collection"
                        );
                        paginate(&items, page, per_page)
                    }
                    None => &items[..],
                };

                retained
                    .iter()
                    .map(|related| self.render_related(related.as_ref()))
                    .collect::<ResourceResult<Vec<_>>>()
                    .map(|rendered| Some(Value::Array(rendered)))
            }
        }
    }

    /// Identifier(s) of the related object(s); page overrides do not apply
    pub fn represent_identifiers(&self) -> ResourceResult<Value> {
        match self.resolve()? {
            Related::One(None) => Ok(Value::Null),
            Related::One(Some(related)) => Ok(related.identifier()),
            Related::Many(items) => Ok(Value::Array(
                items.iter().map(|related| related.identifier()).collect(),
            )),
        }
    }

    /// Read the related object(s) through the reflection's accessor
    fn resolve(&self) -> ResourceResult<Related> {
        let entity = self.ctx.entity;
        let related = entity
            .related(self.reflection.accessor())
            .ok_or_else(|| {
                ResourceError::missing_accessor(entity.entity_type(), self.reflection.accessor())
            })?;

        if related.is_collection() != self.reflection.is_collection() {
            return Err(ResourceError::configuration(format!(
                "Association '{}' on '{}' is declared {} but accessor '{}' returned {}",
                self.reflection.name(),
                self.reflection.owner(),
                self.reflection.kind(),
                self.reflection.accessor(),
                if related.is_collection() {
                    "a collection"
                } else {
                    "a single object"
                }
            )));
        }

        tracing::trace!(
            target: LOG_TARGET,
            association = self.reflection.name(),
            entity_type = entity.entity_type(),
            related = related.len(),
            "resolved association"
        );

        Ok(related)
    }

    fn render_related(&self, related: &dyn Entity) -> ResourceResult<Value> {
        self.ctx
            .scope
            .render_nested(related, self.ctx.frame, self.reflection.target())
    }
}

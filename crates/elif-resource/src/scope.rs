//! Render scope - request-scoped state threaded through every field evaluation
//!
//! A [`RenderScope`] lives for one top-level render. Each rendered object
//! pushes a [`RenderFrame`] that links to its parent, so the chain of frames
//! is the current render stack. Objects already on the stack are emitted as
//! their bare identifier instead of being rendered again, and nesting beyond
//! `max_depth` fails the render.

use serde_json::Value;

use crate::config::ResourceConfig;
use crate::entity::Entity;
use crate::error::{ResourceError, ResourceResult};
use crate::logging::LOG_TARGET;
use crate::options::UserOptions;
use crate::registry::RepresenterRegistry;

/// Request-scoped collaborators shared by every binding in one render
#[derive(Debug, Clone, Copy)]
pub struct RenderScope<'a> {
    registry: &'a RepresenterRegistry,
    config: &'a ResourceConfig,
    options: &'a UserOptions,
}

impl<'a> RenderScope<'a> {
    pub fn new(
        registry: &'a RepresenterRegistry,
        config: &'a ResourceConfig,
        options: &'a UserOptions,
    ) -> Self {
        Self {
            registry,
            config,
            options,
        }
    }

    pub fn registry(&self) -> &'a RepresenterRegistry {
        self.registry
    }

    pub fn config(&self) -> &'a ResourceConfig {
        self.config
    }

    pub fn options(&self) -> &'a UserOptions {
        self.options
    }

    /// Render a top-level object with the representer registered for its type
    pub fn render_root(&self, entity: &dyn Entity) -> ResourceResult<Value> {
        let representer = self.registry.resolve(entity.entity_type())?;
        let frame = RenderFrame::root(entity, representer.entity_type());
        representer.render(entity, self, &frame).map(Value::Object)
    }

    /// Render a related object one level below `parent`
    ///
    /// `target` overrides the representer lookup key; by default the
    /// object's own entity type is used.
    pub fn render_nested(
        &self,
        entity: &dyn Entity,
        parent: &RenderFrame<'_>,
        target: Option<&str>,
    ) -> ResourceResult<Value> {
        let identifier = entity.identifier();

        if parent.contains(entity.entity_type(), &identifier) {
            tracing::trace!(
                target: LOG_TARGET,
                entity_type = entity.entity_type(),
                %identifier,
                "object already on the render stack, emitting identifier"
            );
            return Ok(identifier);
        }

        let representer_key = target.unwrap_or_else(|| entity.entity_type());
        let frame = parent.child(entity, representer_key);
        if frame.depth() > self.config.max_depth {
            return Err(ResourceError::DepthExceeded {
                max_depth: self.config.max_depth,
            });
        }

        let representer = self.registry.resolve(representer_key)?;
        representer.render(entity, self, &frame).map(Value::Object)
    }
}

/// One entry of the render stack
#[derive(Debug)]
pub struct RenderFrame<'a> {
    entity_type: String,
    identifier: Value,
    representer: String,
    depth: usize,
    parent: Option<&'a RenderFrame<'a>>,
}

impl<'a> RenderFrame<'a> {
    /// Frame for the top-level object
    pub fn root(entity: &dyn Entity, representer: &str) -> Self {
        Self {
            entity_type: entity.entity_type().to_string(),
            identifier: entity.identifier(),
            representer: representer.to_string(),
            depth: 0,
            parent: None,
        }
    }

    /// Frame for an object rendered inside this one
    pub fn child(&'a self, entity: &dyn Entity, representer: &str) -> RenderFrame<'a> {
        RenderFrame {
            entity_type: entity.entity_type().to_string(),
            identifier: entity.identifier(),
            representer: representer.to_string(),
            depth: self.depth + 1,
            parent: Some(self),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn identifier(&self) -> &Value {
        &self.identifier
    }

    /// Entity type of the representer rendering this frame
    pub fn representer(&self) -> &str {
        &self.representer
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether an object with this type and identifier is on the stack
    pub fn contains(&self, entity_type: &str, identifier: &Value) -> bool {
        let mut frame = Some(self);
        while let Some(current) = frame {
            if current.entity_type == entity_type && &current.identifier == identifier {
                return true;
            }
            frame = current.parent;
        }
        false
    }
}

//! Renderer - top-level entry point tying registry, configuration and
//! request options together

use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::ResourceConfig;
use crate::entity::Entity;
use crate::error::ResourceResult;
use crate::logging::LOG_TARGET;
use crate::options::UserOptions;
use crate::pagination::{paginate, PaginationMeta};
use crate::registry::RepresenterRegistry;
use crate::scope::RenderScope;

/// Renders entities with the representers registered for their types
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: RepresenterRegistry,
    config: ResourceConfig,
}

impl Renderer {
    /// Create a renderer with the default configuration
    pub fn new(registry: RepresenterRegistry) -> Self {
        Self {
            registry,
            config: ResourceConfig::default(),
        }
    }

    /// Replace the configuration after validating it
    pub fn with_config(mut self, config: ResourceConfig) -> ResourceResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn registry(&self) -> &RepresenterRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Parse request options using this renderer's parameter names
    pub fn options_from_query(&self, query: &str) -> ResourceResult<UserOptions> {
        UserOptions::from_query(query, &self.config)
    }

    /// Render a single object
    pub fn render(&self, entity: &dyn Entity, options: &UserOptions) -> ResourceResult<Value> {
        let scope = RenderScope::new(&self.registry, &self.config, options);
        scope.render_root(entity).inspect_err(|err| {
            tracing::warn!(
                target: LOG_TARGET,
                entity_type = entity.entity_type(),
                error = %err,
                "resource render failed"
            );
        })
    }

    /// Render every object, preserving order
    pub fn render_many(
        &self,
        entities: &[Arc<dyn Entity>],
        options: &UserOptions,
    ) -> ResourceResult<Value> {
        entities
            .iter()
            .map(|entity| self.render(entity.as_ref(), options))
            .collect::<ResourceResult<Vec<_>>>()
            .map(Value::Array)
    }

    /// Render one page of a top-level listing as `{data, meta}`
    pub fn render_page(
        &self,
        entities: &[Arc<dyn Entity>],
        page: usize,
        options: &UserOptions,
    ) -> ResourceResult<Value> {
        let per_page = self.config.per_page;
        let meta = PaginationMeta::new(page, per_page, entities.len());
        let data = self.render_many(paginate(entities, page, per_page), options)?;

        Ok(json!({
            "data": data,
            "meta": serde_json::to_value(meta)?,
        }))
    }

    /// Render a single object straight to a JSON string
    pub fn to_json_string(
        &self,
        entity: &dyn Entity,
        options: &UserOptions,
    ) -> ResourceResult<String> {
        let value = self.render(entity, options)?;
        Ok(serde_json::to_string(&value)?)
    }
}

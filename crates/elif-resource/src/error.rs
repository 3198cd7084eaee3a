//! Error types for resource rendering
//!
//! Every failure aborts the whole render. Nothing here is retried: rendering
//! is synchronous and deterministic, so the caller maps the error to an HTTP
//! response instead.

use crate::config::ConfigError;
use thiserror::Error;

/// Result type alias for resource operations
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Error type for representer declaration and rendering
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Entity '{entity_type}' has no accessor named '{accessor}'")]
    MissingAccessor {
        entity_type: String,
        accessor: String,
    },

    #[error("No representer registered for entity type '{entity_type}'")]
    MissingRepresenter { entity_type: String },

    #[error("Condition on association '{association}' failed: {message}")]
    ConditionEvaluation {
        association: String,
        message: String,
    },

    #[error("Failed to render '{entity_type}': {message}")]
    Render {
        entity_type: String,
        message: String,
    },

    #[error("Render depth exceeded the configured maximum of {max_depth}")]
    DepthExceeded { max_depth: usize },

    #[error("Invalid value '{value}' for request parameter '{name}'")]
    InvalidParameter { name: String, value: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResourceError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing accessor error
    pub fn missing_accessor(entity_type: impl Into<String>, accessor: impl Into<String>) -> Self {
        Self::MissingAccessor {
            entity_type: entity_type.into(),
            accessor: accessor.into(),
        }
    }

    /// Create a missing representer error
    pub fn missing_representer(entity_type: impl Into<String>) -> Self {
        Self::MissingRepresenter {
            entity_type: entity_type.into(),
        }
    }

    /// Create a condition evaluation error, for use inside condition predicates
    pub fn condition(association: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConditionEvaluation {
            association: association.into(),
            message: message.into(),
        }
    }

    /// Create a render error, for use inside computed field getters
    pub fn render(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }

    /// Create an invalid request parameter error
    pub fn invalid_parameter(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether this error points at a developer mistake rather than bad input
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::MissingAccessor { .. }
                | Self::MissingRepresenter { .. }
                | Self::Config(_)
        )
    }
}

//! Resource rendering configuration
//!
//! Values come from defaults, environment variables (`ELIF_RESOURCE_*`),
//! YAML, or the builder methods, and are validated before a renderer
//! accepts them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

pub const ENV_PER_PAGE: &str = "ELIF_RESOURCE_PER_PAGE";
pub const ENV_MAX_DEPTH: &str = "ELIF_RESOURCE_MAX_DEPTH";
pub const ENV_INCLUDE_PARAM: &str = "ELIF_RESOURCE_INCLUDE_PARAM";
pub const ENV_PAGE_SUFFIX: &str = "ELIF_RESOURCE_PAGE_SUFFIX";

const DEFAULT_PER_PAGE: usize = 10;
const DEFAULT_MAX_DEPTH: usize = 8;
const DEFAULT_INCLUDE_PARAM: &str = "include";
const DEFAULT_PAGE_SUFFIX: &str = "Page";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value loaded from environment variable
    EnvVar(String),
    /// Default value used
    Default,
    /// Value loaded from a YAML document
    Yaml,
    /// Value provided programmatically
    Programmatic,
}

impl ConfigSource {
    /// Check if source is environment variable
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    /// Check if source is default value
    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default)
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::EnvVar(var) => write!(f, "Environment variable: {}", var),
            ConfigSource::Default => write!(f, "Default value"),
            ConfigSource::Yaml => write!(f, "YAML document"),
            ConfigSource::Programmatic => write!(f, "Programmatically set"),
        }
    }
}

/// Settings shared by every render performed through a [`crate::Renderer`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Page size for nested collections and top-level listings
    pub per_page: usize,
    /// Maximum nesting depth below the root object
    pub max_depth: usize,
    /// Query parameter carrying the comma separated include list
    pub include_param: String,
    /// Suffix that turns an association name into its page parameter
    pub page_param_suffix: String,
    #[serde(skip)]
    sources: HashMap<String, ConfigSource>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            max_depth: DEFAULT_MAX_DEPTH,
            include_param: DEFAULT_INCLUDE_PARAM.to_string(),
            page_param_suffix: DEFAULT_PAGE_SUFFIX.to_string(),
            sources: HashMap::new(),
        }
    }
}

impl ResourceConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self.sources
            .insert("per_page".to_string(), ConfigSource::Programmatic);
        self
    }

    /// Set the maximum render depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self.sources
            .insert("max_depth".to_string(), ConfigSource::Programmatic);
        self
    }

    /// Set the include query parameter name
    pub fn with_include_param(mut self, param: impl Into<String>) -> Self {
        self.include_param = param.into();
        self.sources
            .insert("include_param".to_string(), ConfigSource::Programmatic);
        self
    }

    /// Set the page parameter suffix
    pub fn with_page_param_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.page_param_suffix = suffix.into();
        self.sources
            .insert("page_param_suffix".to_string(), ConfigSource::Programmatic);
        self
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(per_page) = env_value::<usize>(ENV_PER_PAGE, "per_page", "positive integer")? {
            config.per_page = per_page;
            config
                .sources
                .insert("per_page".to_string(), ConfigSource::EnvVar(ENV_PER_PAGE.to_string()));
        }

        if let Some(max_depth) =
            env_value::<usize>(ENV_MAX_DEPTH, "max_depth", "positive integer")?
        {
            config.max_depth = max_depth;
            config
                .sources
                .insert("max_depth".to_string(), ConfigSource::EnvVar(ENV_MAX_DEPTH.to_string()));
        }

        if let Ok(param) = env::var(ENV_INCLUDE_PARAM) {
            config.include_param = param.trim().to_string();
            config.sources.insert(
                "include_param".to_string(),
                ConfigSource::EnvVar(ENV_INCLUDE_PARAM.to_string()),
            );
        }

        if let Ok(suffix) = env::var(ENV_PAGE_SUFFIX) {
            config.page_param_suffix = suffix.trim().to_string();
            config.sources.insert(
                "page_param_suffix".to_string(),
                ConfigSource::EnvVar(ENV_PAGE_SUFFIX.to_string()),
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML document; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        for field in ["per_page", "max_depth", "include_param", "page_param_suffix"] {
            config.sources.insert(field.to_string(), ConfigSource::Yaml);
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_page == 0 {
            return Err(ConfigError::invalid_value("per_page", "0", "positive integer"));
        }

        if self.max_depth == 0 {
            return Err(ConfigError::invalid_value("max_depth", "0", "positive integer"));
        }

        if self.include_param.is_empty() {
            return Err(ConfigError::validation_failed("include_param cannot be empty"));
        }

        if self.page_param_suffix.is_empty() {
            return Err(ConfigError::validation_failed(
                "page_param_suffix cannot be empty",
            ));
        }

        if self.include_param.ends_with(&self.page_param_suffix) {
            return Err(ConfigError::validation_failed(format!(
                "include_param '{}' would be read as a page parameter",
                self.include_param
            )));
        }

        Ok(())
    }

    /// Get configuration source information for debugging
    pub fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        for field in ["per_page", "max_depth", "include_param", "page_param_suffix"] {
            let source = self
                .sources
                .get(field)
                .cloned()
                .unwrap_or(ConfigSource::Default);
            sources.insert(field.to_string(), source);
        }
        sources
    }

    /// Name of the query parameter holding the page number for an association
    pub fn page_param(&self, association: &str) -> String {
        format!("{}{}", association, self.page_param_suffix)
    }
}

fn env_value<T: FromStr>(var: &str, field: &str, expected: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::invalid_value(field, raw.as_str(), expected)),
        Err(_) => Ok(None),
    }
}

//! Per-request user options: which associations to sideload and which page
//! of each nested collection to return

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::config::ResourceConfig;
use crate::error::{ResourceError, ResourceResult};

/// Caller intent for a single render, built fresh for every request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserOptions {
    include: HashSet<String>,
    pages: HashMap<String, usize>,
    current_user: Option<Value>,
    attributes: Map<String, Value>,
}

impl UserOptions {
    /// Create empty options (nothing included, no page overrides)
    pub fn new() -> Self {
        Self::default()
    }

    /// Request full embedding of an association
    pub fn include(mut self, name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        if !name.is_empty() {
            self.include.insert(name.to_string());
        }
        self
    }

    /// Request full embedding of several associations
    pub fn include_all<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().fold(self, |options, name| options.include(name))
    }

    /// Request a specific page of an association's nested collection
    pub fn with_page(mut self, name: impl Into<String>, page: usize) -> Self {
        self.pages.insert(name.into(), page);
        self
    }

    /// Attach the caller's identity for condition predicates
    pub fn with_current_user(mut self, user: impl Into<Value>) -> Self {
        self.current_user = Some(user.into());
        self
    }

    /// Attach a request-scoped value for condition predicates
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether the association was requested for full embedding
    pub fn includes(&self, name: &str) -> bool {
        self.include.contains(name)
    }

    /// Requested page for an association, if any
    pub fn page_for(&self, name: &str) -> Option<usize> {
        self.pages.get(name).copied()
    }

    /// The caller's identity, if known
    pub fn current_user(&self) -> Option<&Value> {
        self.current_user.as_ref()
    }

    /// A request-scoped value
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Included association names, sorted
    pub fn included(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.include.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse options from a raw query string such as `include=posts,comments&postsPage=2`
    pub fn from_query(query: &str, config: &ResourceConfig) -> ResourceResult<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|_| ResourceError::invalid_parameter("query", query))?;
        Self::from_pairs(pairs, config)
    }

    /// Build options from already decoded query pairs
    ///
    /// A `{name}{suffix}` key is a page override only when `name` is in the
    /// include list; any other key ending in the suffix (`perPage`, say)
    /// belongs to the surrounding layer and is left alone.
    pub fn from_pairs<I, K, V>(pairs: I, config: &ResourceConfig) -> ResourceResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(K, V)> = pairs.into_iter().collect();

        let mut options = pairs
            .iter()
            .filter(|(key, _)| key.as_ref() == config.include_param)
            .fold(Self::new(), |options, (_, value)| {
                options.include_all(value.as_ref().split(','))
            });

        for (key, value) in &pairs {
            let (key, value) = (key.as_ref(), value.as_ref());

            let Some(association) = key.strip_suffix(config.page_param_suffix.as_str()) else {
                continue;
            };
            if key == config.include_param || !options.includes(association) {
                continue;
            }

            let page = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|page| *page > 0)
                .ok_or_else(|| ResourceError::invalid_parameter(key, value))?;
            options.pages.insert(association.to_string(), page);
        }

        Ok(options)
    }
}

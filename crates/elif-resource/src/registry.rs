//! Registries - association reflections per representer, and representers
//! per entity type

use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ResourceError, ResourceResult};
use crate::logging::LOG_TARGET;
use crate::reflection::{AssociationKind, Reflection};
use crate::representer::Representer;

/// Association name -> Reflection for a single representer
#[derive(Debug, Clone, Default)]
pub struct AssociationRegistry {
    reflections: HashMap<String, Arc<Reflection>>,
}

impl AssociationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reflection under its name, returning the one it replaced
    pub fn register(&mut self, reflection: Arc<Reflection>) -> Option<Arc<Reflection>> {
        self.reflections
            .insert(reflection.name().to_string(), reflection)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Reflection>> {
        self.reflections.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.reflections.contains_key(name)
    }

    /// Registered association names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.reflections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Reflection>> {
        self.reflections.values()
    }

    pub fn len(&self) -> usize {
        self.reflections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reflections.is_empty()
    }

    /// Count associations by kind
    pub fn count_by_kind(&self) -> HashMap<AssociationKind, usize> {
        let mut counts = HashMap::new();
        for reflection in self.reflections.values() {
            *counts.entry(reflection.kind()).or_insert(0) += 1;
        }
        counts
    }
}

/// Entity type -> Representer, populated at startup and read concurrently
#[derive(Clone, Default)]
pub struct RepresenterRegistry {
    representers: Arc<DashMap<String, Arc<Representer>>>,
}

impl RepresenterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a representer under its entity type, returning the one it replaced
    pub fn register(&self, representer: Representer) -> Option<Arc<Representer>> {
        let entity_type = representer.entity_type().to_string();
        let previous = self
            .representers
            .insert(entity_type.clone(), Arc::new(representer));

        if previous.is_some() {
            tracing::debug!(target: LOG_TARGET, %entity_type, "replaced representer");
        } else {
            tracing::debug!(target: LOG_TARGET, %entity_type, "registered representer");
        }

        previous
    }

    pub fn get(&self, entity_type: &str) -> Option<Arc<Representer>> {
        self.representers
            .get(entity_type)
            .map(|entry| entry.value().clone())
    }

    /// Look up a representer, failing with a configuration error when missing
    pub fn resolve(&self, entity_type: &str) -> ResourceResult<Arc<Representer>> {
        self.get(entity_type)
            .ok_or_else(|| ResourceError::missing_representer(entity_type))
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.representers.contains_key(entity_type)
    }

    /// Registered entity types, sorted
    pub fn entity_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .representers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.representers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representers.is_empty()
    }

    /// Remove every representer
    pub fn clear(&self) {
        self.representers.clear();
    }

    /// Check that every explicit association target has a representer
    ///
    /// Associations without an explicit target are resolved from the
    /// related object's own type at render time and cannot be checked here.
    pub fn validate(&self) -> ResourceResult<()> {
        // Collect before looking anything up so no shard guard is held
        let targets: Vec<(String, String, String)> = self
            .representers
            .iter()
            .flat_map(|entry| {
                let owner = entry.key().clone();
                entry
                    .value()
                    .associations()
                    .iter()
                    .filter_map(|reflection| {
                        reflection.target().map(|target| {
                            (owner.clone(), reflection.name().to_string(), target.to_string())
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        for (owner, association, target) in targets {
            if !self.contains(&target) {
                return Err(ResourceError::configuration(format!(
                    "Association '{}' on '{}' targets '{}', which has no representer",
                    association, owner, target
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for RepresenterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepresenterRegistry")
            .field("entity_types", &self.entity_types())
            .finish()
    }
}

/// Global registry instance for the application
static GLOBAL_REPRESENTERS: std::sync::OnceLock<RepresenterRegistry> = std::sync::OnceLock::new();

/// Get the global representer registry
pub fn global_representers() -> &'static RepresenterRegistry {
    GLOBAL_REPRESENTERS.get_or_init(RepresenterRegistry::new)
}

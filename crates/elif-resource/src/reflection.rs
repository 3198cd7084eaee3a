//! Association Reflections - immutable declarations of one association each

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::{ResourceError, ResourceResult};
use crate::options::UserOptions;

/// Defines the kind of association between a representer and related objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// Many-to-one (the root holds the reference)
    BelongsTo,
    /// One-to-one
    HasOne,
    /// One-to-many
    HasMany,
    /// Many-to-many through a join table
    HasAndBelongsToMany,
}

impl AssociationKind {
    /// Returns true if this association yields a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::HasAndBelongsToMany)
    }

    /// Snake case name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BelongsTo => "belongs_to",
            Self::HasOne => "has_one",
            Self::HasMany => "has_many",
            Self::HasAndBelongsToMany => "has_and_belongs_to_many",
        }
    }
}

impl FromStr for AssociationKind {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "belongs_to" | "belongsTo" => Ok(Self::BelongsTo),
            "has_one" | "hasOne" => Ok(Self::HasOne),
            "has_many" | "hasMany" => Ok(Self::HasMany),
            "has_and_belongs_to_many" | "hasAndBelongsToMany" => Ok(Self::HasAndBelongsToMany),
            other => Err(ResourceError::configuration(format!(
                "Unknown association kind '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a condition predicate can see about the render in progress
#[derive(Clone, Copy)]
pub struct ConditionContext<'a> {
    /// The root object whose association is being decided
    pub entity: &'a dyn Entity,
    /// Entity type of the representer doing the rendering
    pub representer: &'a str,
    /// Name of the association being decided
    pub association: &'a str,
    /// Nesting depth of the root object (0 for the top-level object)
    pub depth: usize,
}

/// Predicate gating an association; every condition must hold
pub type Condition =
    Arc<dyn Fn(&ConditionContext<'_>, &UserOptions) -> ResourceResult<bool> + Send + Sync>;

/// Options accepted by the declaration API
#[derive(Clone, Default)]
pub struct AssociationOptions {
    pub kind: Option<AssociationKind>,
    pub conditions: Vec<Condition>,
    pub expose_identifier: bool,
    pub accessor: Option<String>,
    pub target: Option<String>,
    pub per_page: Option<usize>,
}

impl AssociationOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the association kind
    pub fn with_kind(mut self, kind: AssociationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Add a condition predicate
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ConditionContext<'_>, &UserOptions) -> ResourceResult<bool> + Send + Sync + 'static,
    {
        self.conditions.push(Arc::new(condition));
        self
    }

    /// Install the identifier field alongside the full field
    pub fn expose_identifier(mut self, expose: bool) -> Self {
        self.expose_identifier = expose;
        self
    }

    /// Read related objects through a differently named accessor
    pub fn with_accessor(mut self, accessor: impl Into<String>) -> Self {
        self.accessor = Some(accessor.into());
        self
    }

    /// Render related objects with the representer registered for this entity type
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Override the page size for this association's nested collection
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = Some(per_page);
        self
    }
}

impl fmt::Debug for AssociationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssociationOptions")
            .field("kind", &self.kind)
            .field("conditions", &self.conditions.len())
            .field("expose_identifier", &self.expose_identifier)
            .field("accessor", &self.accessor)
            .field("target", &self.target)
            .field("per_page", &self.per_page)
            .finish()
    }
}

/// Immutable metadata for one declared association
pub struct Reflection {
    owner: String,
    name: String,
    kind: AssociationKind,
    conditions: Vec<Condition>,
    expose_identifier: bool,
    accessor: String,
    target: Option<String>,
    per_page: Option<usize>,
}

impl Reflection {
    /// Build a reflection for `name` declared on the `owner` representer
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ResourceResult<Self> {
        let owner = owner.into();
        let name = name.into();

        if name.trim().is_empty() {
            return Err(ResourceError::configuration(format!(
                "Association on '{}' must have a name",
                owner
            )));
        }

        let kind = options.kind.ok_or_else(|| {
            ResourceError::configuration(format!(
                "Association '{}' on '{}' has no kind",
                name, owner
            ))
        })?;

        let accessor = options.accessor.unwrap_or_else(|| name.clone());
        if accessor.is_empty() {
            return Err(ResourceError::configuration(format!(
                "Association '{}' on '{}' has an empty accessor",
                name, owner
            )));
        }

        if options.per_page == Some(0) {
            return Err(ResourceError::configuration(format!(
                "Association '{}' on '{}' has a page size of zero",
                name, owner
            )));
        }

        Ok(Self {
            owner,
            name,
            kind,
            conditions: options.conditions,
            expose_identifier: options.expose_identifier,
            accessor,
            target: options.target,
            per_page: options.per_page,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    pub fn accessor(&self) -> &str {
        &self.accessor
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn per_page(&self) -> Option<usize> {
        self.per_page
    }

    pub fn exposes_identifier(&self) -> bool {
        self.expose_identifier
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    /// Returns true for has-many and many-to-many associations
    pub fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }

    /// True iff every condition holds; stops at the first false and
    /// propagates predicate errors unchanged
    pub fn evaluate_conditions(
        &self,
        context: &ConditionContext<'_>,
        options: &UserOptions,
    ) -> ResourceResult<bool> {
        for condition in &self.conditions {
            if !condition(context, options)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Output key of the full field
    pub fn full_key(&self) -> &str {
        &self.name
    }

    /// Output key of the identifier field: `author_id`, `comment_ids`
    pub fn identifier_key(&self) -> String {
        if self.is_collection() {
            format!("{}_ids", pluralizer::pluralize(&self.name, 1, false))
        } else {
            format!("{}_id", self.name)
        }
    }
}

impl fmt::Debug for Reflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflection")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("conditions", &self.conditions.len())
            .field("expose_identifier", &self.expose_identifier)
            .field("accessor", &self.accessor)
            .field("target", &self.target)
            .field("per_page", &self.per_page)
            .finish()
    }
}

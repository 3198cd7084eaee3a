//! # elif-resource: API Resources for elif.rs
//!
//! Declarative JSON representers with association sideloading. A
//! representer declares plain properties and associations (`belongs_to`,
//! `has_one`, `has_many`, `has_and_belongs_to_many`). At render time each
//! association is emitted as:
//!
//! - its full representation, when the request includes it
//!   (`?include=comments`), optionally paginated (`?commentsPage=2`);
//! - its identifier(s) (`author_id`, `comment_ids`), when it is not included
//!   and the declaration exposes identifiers;
//! - nothing at all, when its conditions do not hold.
//!
//! The crate never loads data: related objects are read from the root
//! object through the [`Entity`] trait.

pub mod binding;
pub mod config;
pub mod entity;
pub mod error;
pub mod field;
pub mod installer;
pub mod logging;
pub mod options;
pub mod pagination;
pub mod reflection;
pub mod registry;
pub mod renderer;
pub mod representer;
pub mod scope;

// Re-export main types
pub use binding::*;
pub use config::*;
pub use entity::*;
pub use error::*;
pub use field::*;
pub use logging::*;
pub use options::*;
pub use pagination::*;
pub use reflection::*;
pub use registry::*;
pub use renderer::*;
pub use representer::*;
pub use scope::*;

//! Hierarchical configuration trees.
//!
//! A [`TreeNode`] is a value, an ordered list or a keyed container. The
//! converter turns a tree into a plain nested structure ([`Nested`]) and
//! back, and [`Source`] attaches a type label and metadata to a tree so the
//! rest of a configuration system can consume it.
//!
//! ```
//! use cfgtree::{to_hierarchical_map, wrap_as_source, TreeNode};
//!
//! let tree = TreeNode::container([("name", TreeNode::value("app"))]);
//! let nested = to_hierarchical_map(&tree);
//! let source = wrap_as_source(&nested, "map");
//! assert_eq!(source.tree(), &tree);
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod util;

pub use application::{
    empty_map_source, from_hierarchical_map, to_hierarchical_map, wrap_as_source,
    ApplicationError, ApplicationResult, Converter, MapSource, Source, SourceInfo,
    TreeNodeConvert, TreeRenderer,
};
pub use crate::config::{Loader, Settings};
pub use domain::{
    DomainError, DomainResult, Nested, NodeKind, Scalar, TreeNode, MAX_SERIALIZE_DEPTH,
};

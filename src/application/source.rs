//! Sources: named, typed wrappers around a tree root.

use std::ops::Deref;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::{debug, instrument};

use crate::application::converter::{from_hierarchical_map, to_hierarchical_map};
use crate::domain::{Nested, TreeNode};

/// Type label used when a map source is created without one.
pub const DEFAULT_MAP_TYPE: &str = "map";

/// Type label of the shared empty map source.
pub const EMPTY_MAP_TYPE: &str = "empty map";

/// Ordered metadata describing where a source came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo(IndexMap<String, String>);

impl SourceInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One logical configuration input: a tree plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    tree: TreeNode,
    kind: String,
    info: SourceInfo,
}

impl Source {
    pub fn new(tree: TreeNode, kind: impl Into<String>, info: SourceInfo) -> Self {
        Self {
            tree,
            kind: kind.into(),
            info,
        }
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    pub fn into_tree(self) -> TreeNode {
        self.tree
    }

    /// Provenance tag, e.g. `"map"` or `"empty map"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    /// Human readable summary for error messages: `[type: map, origin: defaults]`.
    pub fn description(&self) -> String {
        let entries: Vec<String> = std::iter::once(("type", self.kind.as_str()))
            .chain(self.info.iter())
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        format!("[{}]", entries.join(", "))
    }

    /// Look up a node by container keys.
    pub fn get(&self, path: &[&str]) -> Option<&TreeNode> {
        self.tree.get(path)
    }

    /// Look up a node by a dot-separated path.
    pub fn get_dotted(&self, path: &str) -> Option<&TreeNode> {
        self.tree.get_dotted(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get_dotted(path).is_some()
    }

    pub fn to_hierarchical_map(&self) -> Nested {
        to_hierarchical_map(&self.tree)
    }
}

/// Lift a native nested structure into a source.
///
/// Maps become container roots, lists become list roots and anything else
/// a value root. An empty label falls back to [`DEFAULT_MAP_TYPE`].
#[instrument(level = "debug", skip(nested))]
pub fn wrap_as_source(nested: &Nested, type_label: &str) -> Source {
    let tree = from_hierarchical_map(nested);
    debug!(kind = %tree.kind(), "wrapped nested structure");
    Source::new(tree, label_or_default(type_label), SourceInfo::new())
}

fn label_or_default(type_label: &str) -> &str {
    if type_label.is_empty() {
        DEFAULT_MAP_TYPE
    } else {
        type_label
    }
}

/// Source built from a hierarchical map.
///
/// Keeps the map it was built from next to the tree. Dereferences to
/// [`Source`] for everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSource {
    map: IndexMap<String, Nested>,
    source: Source,
}

impl MapSource {
    pub fn new(map: IndexMap<String, Nested>, type_label: &str, info: SourceInfo) -> Self {
        let nested = Nested::Map(map);
        let tree = from_hierarchical_map(&nested);
        let map = nested.into_map().unwrap_or_default();
        Self {
            map,
            source: Source::new(tree, label_or_default(type_label), info),
        }
    }

    pub fn map(&self) -> &IndexMap<String, Nested> {
        &self.map
    }

    pub fn into_source(self) -> Source {
        self.source
    }
}

impl From<IndexMap<String, Nested>> for MapSource {
    fn from(map: IndexMap<String, Nested>) -> Self {
        MapSource::new(map, DEFAULT_MAP_TYPE, SourceInfo::new())
    }
}

impl Deref for MapSource {
    type Target = Source;

    fn deref(&self) -> &Source {
        &self.source
    }
}

static EMPTY_MAP_SOURCE: Lazy<MapSource> =
    Lazy::new(|| MapSource::new(IndexMap::new(), EMPTY_MAP_TYPE, SourceInfo::new()));

/// Process-wide source wrapping an empty container, labelled `"empty map"`.
pub fn empty_map_source() -> &'static MapSource {
    &EMPTY_MAP_SOURCE
}

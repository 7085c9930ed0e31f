//! Conversion between configuration trees and native nested structures.
//!
//! Both directions walk the input with an explicit work stack instead of
//! recursing, so tree depth is bounded by memory rather than by the call
//! stack. Outputs are freshly allocated; nothing is shared with the input
//! except opaque scalar handles, which are immutable.

use std::fmt::Write;

use indexmap::IndexMap;
use tracing::{debug, instrument, trace};

use crate::application::error::ApplicationResult;
use crate::config::Settings;
use crate::domain::{DomainError, DomainResult, Nested, NodeKind, TreeNode};

/// Position of a node relative to its parent, used to name the offending
/// node when a depth limit is hit.
#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Root,
    Key(&'a str),
    Index(usize),
}

fn render_path(ancestors: &[Segment<'_>], current: Segment<'_>) -> String {
    let mut out = String::new();
    for segment in ancestors.iter().chain(std::iter::once(&current)) {
        match segment {
            Segment::Root => {}
            Segment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            Segment::Index(i) => {
                let _ = write!(out, "[{}]", i);
            }
        }
    }
    if out.is_empty() {
        out.push_str("<root>");
    }
    out
}

fn check_depth(
    max_depth: Option<usize>,
    ancestors: &[Segment<'_>],
    current: Segment<'_>,
) -> DomainResult<()> {
    match max_depth {
        Some(max) if ancestors.len() + 1 > max => Err(DomainError::DepthExceeded {
            max_depth: max,
            path: render_path(ancestors, current),
        }),
        _ => Ok(()),
    }
}

/// Pending work for the tree walk. `Enter` visits a node; the exit frames
/// collect the already converted children from the result stack.
enum Frame<'a, N> {
    Enter(&'a N, Segment<'a>),
    ExitList(usize),
    ExitMap(Vec<&'a str>),
}

fn serialize(tree: &TreeNode, max_depth: Option<usize>) -> DomainResult<Nested> {
    let mut work = vec![Frame::Enter(tree, Segment::Root)];
    let mut path: Vec<Segment> = Vec::new();
    let mut done: Vec<Nested> = Vec::new();

    while let Some(frame) = work.pop() {
        match frame {
            Frame::Enter(node, segment) => {
                check_depth(max_depth, &path, segment)?;
                match node {
                    TreeNode::Value(value) => done.push(Nested::Scalar(value.clone())),
                    TreeNode::List(items) => {
                        path.push(segment);
                        work.push(Frame::ExitList(items.len()));
                        // Reverse so the first child is converted first
                        work.extend(
                            items
                                .iter()
                                .enumerate()
                                .rev()
                                .map(|(i, child)| Frame::Enter(child, Segment::Index(i))),
                        );
                    }
                    TreeNode::Container(children) => {
                        path.push(segment);
                        work.push(Frame::ExitMap(children.keys().map(String::as_str).collect()));
                        work.extend(
                            children
                                .iter()
                                .rev()
                                .map(|(key, child)| Frame::Enter(child, Segment::Key(key))),
                        );
                    }
                }
            }
            Frame::ExitList(len) => {
                path.pop();
                let items = done.split_off(done.len() - len);
                done.push(Nested::List(items));
            }
            Frame::ExitMap(keys) => {
                path.pop();
                let values = done.split_off(done.len() - keys.len());
                let map = keys.into_iter().map(str::to_string).zip(values).collect();
                done.push(Nested::Map(map));
            }
        }
    }

    // The walk leaves exactly the converted root behind
    Ok(done.pop().unwrap_or_default())
}

fn build(nested: &Nested, max_depth: Option<usize>) -> DomainResult<TreeNode> {
    let mut work = vec![Frame::Enter(nested, Segment::Root)];
    let mut path: Vec<Segment> = Vec::new();
    let mut done: Vec<TreeNode> = Vec::new();

    while let Some(frame) = work.pop() {
        match frame {
            Frame::Enter(value, segment) => {
                check_depth(max_depth, &path, segment)?;
                match value {
                    Nested::Scalar(scalar) => done.push(TreeNode::Value(scalar.clone())),
                    Nested::List(items) => {
                        path.push(segment);
                        work.push(Frame::ExitList(items.len()));
                        work.extend(
                            items
                                .iter()
                                .enumerate()
                                .rev()
                                .map(|(i, child)| Frame::Enter(child, Segment::Index(i))),
                        );
                    }
                    Nested::Map(map) => {
                        path.push(segment);
                        work.push(Frame::ExitMap(map.keys().map(String::as_str).collect()));
                        work.extend(
                            map.iter()
                                .rev()
                                .map(|(key, child)| Frame::Enter(child, Segment::Key(key))),
                        );
                    }
                }
            }
            Frame::ExitList(len) => {
                path.pop();
                let items = done.split_off(done.len() - len);
                done.push(TreeNode::List(items));
            }
            Frame::ExitMap(keys) => {
                path.pop();
                let children = done.split_off(done.len() - keys.len());
                let map = keys.into_iter().map(str::to_string).zip(children).collect();
                done.push(TreeNode::Container(map));
            }
        }
    }

    Ok(done.pop().unwrap_or_default())
}

/// Serialize a tree into a native nested structure.
///
/// Values map to their scalar, lists to a list of the same length and
/// order, containers to a map with the same keys in the same order.
/// Total over every tree and never fails.
#[instrument(level = "trace", skip(tree))]
pub fn to_hierarchical_map(tree: &TreeNode) -> Nested {
    match serialize(tree, None) {
        Ok(nested) => nested,
        Err(e) => unreachable!("unbounded conversion failed: {}", e),
    }
}

/// Build a tree from a native nested structure: maps become containers,
/// lists become lists, everything else becomes a value.
#[instrument(level = "trace", skip(nested))]
pub fn from_hierarchical_map(nested: &Nested) -> TreeNode {
    match build(nested, None) {
        Ok(tree) => tree,
        Err(e) => unreachable!("unbounded conversion failed: {}", e),
    }
}

impl TreeNode {
    /// Shorthand for [`to_hierarchical_map`].
    pub fn to_hierarchical_map(&self) -> Nested {
        to_hierarchical_map(self)
    }
}

/// Converter with an optional depth limit.
///
/// Without a limit it behaves exactly like the free functions. With one,
/// any node deeper than `max_depth` (the root is at depth 1) aborts the
/// conversion with [`DomainError::DepthExceeded`] naming that node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Converter {
    max_depth: Option<usize>,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit conversions to `max_depth` levels; 0 means unbounded.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: (max_depth > 0).then_some(max_depth),
        }
    }

    /// Configure from settings, with the same meaning of 0 as [`Converter::with_max_depth`].
    pub fn from_settings(settings: &Settings) -> Self {
        let converter = Self::with_max_depth(settings.converter.max_depth);
        debug!(max_depth = ?converter.max_depth, "converter configured");
        converter
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[instrument(level = "debug", skip(self, tree))]
    pub fn to_hierarchical_map(&self, tree: &TreeNode) -> ApplicationResult<Nested> {
        let nested = serialize(tree, self.max_depth)?;
        trace!(kind = %tree.kind(), "tree serialized");
        Ok(nested)
    }

    /// Serialize a container-rooted tree into a map.
    pub fn to_map(&self, tree: &TreeNode) -> ApplicationResult<IndexMap<String, Nested>> {
        if !tree.is_container() {
            return Err(DomainError::UnexpectedRoot {
                expected: NodeKind::Container,
                found: tree.kind(),
            }
            .into());
        }
        let nested = self.to_hierarchical_map(tree)?;
        Ok(nested.into_map().unwrap_or_default())
    }

    #[instrument(level = "debug", skip(self, nested))]
    pub fn from_hierarchical_map(&self, nested: &Nested) -> ApplicationResult<TreeNode> {
        let tree = build(nested, self.max_depth)?;
        trace!(kind = %tree.kind(), "tree built");
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Scalar;

    fn chain(depth: usize) -> TreeNode {
        let mut node = TreeNode::value(0);
        for _ in 1..depth {
            node = TreeNode::container([("n", node)]);
        }
        node
    }

    #[test]
    fn given_paths_when_rendering_then_joins_keys_and_indices() {
        let ancestors = [Segment::Root, Segment::Key("db"), Segment::Key("ports")];
        assert_eq!(render_path(&ancestors, Segment::Index(1)), "db.ports[1]");
        assert_eq!(render_path(&[], Segment::Root), "<root>");
    }

    #[test]
    fn given_limit_when_tree_fits_then_converts() {
        let tree = chain(3);
        assert_eq!(tree.depth(), 3);
        let nested = Converter::with_max_depth(3).to_hierarchical_map(&tree).unwrap();
        assert_eq!(
            nested.get(&["n", "n"]).and_then(|n| n.as_scalar()),
            Some(&Scalar::from(0))
        );
    }

    #[test]
    fn given_limit_when_tree_too_deep_then_names_first_offending_node() {
        let err = Converter::with_max_depth(2)
            .to_hierarchical_map(&chain(3))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "tree depth exceeds limit of 2 at: n.n"
        );
    }

    #[test]
    fn given_zero_limit_when_converting_then_unbounded_like_settings() {
        let converter = Converter::with_max_depth(0);
        assert_eq!(converter.max_depth(), None);
        assert_eq!(converter, Converter::from_settings(&Settings::default()));
        assert!(converter.to_hierarchical_map(&chain(50)).is_ok());
        assert!(converter.to_map(&TreeNode::empty_container()).is_ok());
    }

    #[test]
    fn given_value_root_when_converting_to_map_then_unexpected_root() {
        let err = Converter::new().to_map(&TreeNode::value(1)).unwrap_err();
        assert_eq!(err.to_string(), "expected a container at root, found a value");
    }
}

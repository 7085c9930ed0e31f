//! Tree node model: values, ordered lists and keyed containers.

use std::fmt;
use std::mem;

use indexmap::IndexMap;
use tracing::instrument;

use crate::domain::scalar::Scalar;

/// Variant tag of a [`TreeNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Value,
    List,
    Container,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Value => write!(f, "value"),
            NodeKind::List => write!(f, "list"),
            NodeKind::Container => write!(f, "container"),
        }
    }
}

/// One node of a configuration tree.
///
/// Children are owned by their parent, so a tree can neither alias a
/// subtree nor contain itself. Container keys are unique by construction
/// and keep insertion order.
#[derive(Debug)]
pub enum TreeNode {
    /// Terminal node holding a single scalar.
    Value(Scalar),
    /// Ordered, possibly heterogeneous children.
    List(Vec<TreeNode>),
    /// Keyed children, e.g. a configuration section.
    Container(IndexMap<String, TreeNode>),
}

impl Default for TreeNode {
    fn default() -> Self {
        TreeNode::empty_container()
    }
}

impl TreeNode {
    pub fn value(value: impl Into<Scalar>) -> Self {
        TreeNode::Value(value.into())
    }

    pub fn list(items: impl IntoIterator<Item = TreeNode>) -> Self {
        TreeNode::List(items.into_iter().collect())
    }

    /// Build a container; a repeated key keeps its first position and takes the last value.
    pub fn container<K: Into<String>>(children: impl IntoIterator<Item = (K, TreeNode)>) -> Self {
        TreeNode::Container(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn empty_container() -> Self {
        TreeNode::Container(IndexMap::new())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            TreeNode::Value(_) => NodeKind::Value,
            TreeNode::List(_) => NodeKind::List,
            TreeNode::Container(_) => NodeKind::Container,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, TreeNode::Value(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TreeNode::List(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, TreeNode::Container(_))
    }

    pub fn as_value(&self) -> Option<&Scalar> {
        match self {
            TreeNode::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TreeNode]> {
        match self {
            TreeNode::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&IndexMap<String, TreeNode>> {
        match self {
            TreeNode::Container(children) => Some(children),
            _ => None,
        }
    }

    /// Look up a descendant by container keys.
    ///
    /// An empty path returns the node itself. Lists and values cannot be
    /// descended into, so a path through them yields `None`.
    pub fn get(&self, path: &[&str]) -> Option<&TreeNode> {
        let mut current = self;
        for segment in path {
            current = current.children()?.get(*segment)?;
        }
        Some(current)
    }

    /// Like [`TreeNode::get`] with a dot-separated path.
    pub fn get_dotted(&self, path: &str) -> Option<&TreeNode> {
        if path.is_empty() {
            return Some(self);
        }
        let segments: Vec<&str> = path.split('.').collect();
        self.get(&segments)
    }

    /// Number of levels in the tree; a lone value or an empty container counts as 1.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 1)];

        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            match node {
                TreeNode::Value(_) => {}
                TreeNode::List(items) => stack.extend(items.iter().map(|c| (c, depth + 1))),
                TreeNode::Container(children) => {
                    stack.extend(children.values().map(|c| (c, depth + 1)))
                }
            }
        }
        max_depth
    }

    /// Dotted paths of every leaf reachable through containers.
    ///
    /// Values and lists are leaves; empty containers below the root are
    /// reported too so that no key is lost. Paths come in iteration order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut leaves = Vec::new();
        let mut stack: Vec<(String, &TreeNode)> = vec![(String::new(), self)];

        while let Some((prefix, node)) = stack.pop() {
            match node {
                TreeNode::Container(children) if !children.is_empty() => {
                    // Push in reverse for left-to-right output
                    for (key, child) in children.iter().rev() {
                        let path = if prefix.is_empty() {
                            key.clone()
                        } else {
                            format!("{}.{}", prefix, key)
                        };
                        stack.push((path, child));
                    }
                }
                _ => {
                    if !prefix.is_empty() {
                        leaves.push(prefix);
                    }
                }
            }
        }
        leaves
    }
}

// Structural equality: same variant at every position, same scalars,
// same list order, same key set. Container key order is not compared.
impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            match (a, b) {
                (TreeNode::Value(x), TreeNode::Value(y)) => {
                    if x != y {
                        return false;
                    }
                }
                (TreeNode::List(x), TreeNode::List(y)) => {
                    if x.len() != y.len() {
                        return false;
                    }
                    stack.extend(x.iter().zip(y.iter()));
                }
                (TreeNode::Container(x), TreeNode::Container(y)) => {
                    if x.len() != y.len() {
                        return false;
                    }
                    for (key, child) in x {
                        match y.get(key) {
                            Some(other_child) => stack.push((child, other_child)),
                            None => return false,
                        }
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

// Copies bottom-up from an explicit work stack: finished subtrees land on
// `done` in order and are collected when their parent's exit frame pops.
impl Clone for TreeNode {
    fn clone(&self) -> Self {
        enum Frame<'a> {
            Enter(&'a TreeNode),
            ExitList(usize),
            ExitContainer(Vec<String>),
        }

        let mut work = vec![Frame::Enter(self)];
        let mut done: Vec<TreeNode> = Vec::new();
        while let Some(frame) = work.pop() {
            match frame {
                Frame::Enter(TreeNode::Value(value)) => done.push(TreeNode::Value(value.clone())),
                Frame::Enter(TreeNode::List(items)) => {
                    work.push(Frame::ExitList(items.len()));
                    work.extend(items.iter().rev().map(Frame::Enter));
                }
                Frame::Enter(TreeNode::Container(children)) => {
                    work.push(Frame::ExitContainer(children.keys().cloned().collect()));
                    work.extend(children.values().rev().map(Frame::Enter));
                }
                Frame::ExitList(len) => {
                    let items = done.split_off(done.len() - len);
                    done.push(TreeNode::List(items));
                }
                Frame::ExitContainer(keys) => {
                    let children = done.split_off(done.len() - keys.len());
                    done.push(TreeNode::Container(keys.into_iter().zip(children).collect()));
                }
            }
        }
        done.pop().unwrap_or_default()
    }
}

// Tear down without recursion so that arbitrarily deep trees cannot
// overflow the stack when they go out of scope.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut stack: Vec<TreeNode> = match self {
            TreeNode::Value(_) => return,
            TreeNode::List(items) => mem::take(items),
            TreeNode::Container(children) => mem::take(children).into_values().collect(),
        };
        while let Some(mut node) = stack.pop() {
            match &mut node {
                TreeNode::Value(_) => {}
                TreeNode::List(items) => stack.append(items),
                TreeNode::Container(children) => stack.extend(mem::take(children).into_values()),
            }
        }
    }
}

impl From<Scalar> for TreeNode {
    fn from(value: Scalar) -> Self {
        TreeNode::Value(value)
    }
}

impl From<Vec<TreeNode>> for TreeNode {
    fn from(items: Vec<TreeNode>) -> Self {
        TreeNode::List(items)
    }
}

impl From<IndexMap<String, TreeNode>> for TreeNode {
    fn from(children: IndexMap<String, TreeNode>) -> Self {
        TreeNode::Container(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        TreeNode::container([
            (
                "db",
                TreeNode::container([
                    ("host", TreeNode::value("localhost")),
                    (
                        "ports",
                        TreeNode::list([TreeNode::value(5432), TreeNode::value(5433)]),
                    ),
                ]),
            ),
            ("debug", TreeNode::value(true)),
            ("extra", TreeNode::empty_container()),
        ])
    }

    #[test]
    fn given_tree_when_getting_path_then_descends_containers() {
        let tree = sample();
        assert_eq!(
            tree.get(&["db", "host"]).and_then(|n| n.as_value()),
            Some(&Scalar::from("localhost"))
        );
        assert_eq!(tree.get(&[]), Some(&tree));
        assert!(tree.get(&["db", "ports", "0"]).is_none());
        assert!(tree.get(&["missing"]).is_none());
        assert_eq!(tree.get_dotted("db.ports").map(|n| n.kind()), Some(NodeKind::List));
    }

    #[test]
    fn given_tree_when_computing_depth_then_counts_levels() {
        assert_eq!(sample().depth(), 4);
        assert_eq!(TreeNode::value(1).depth(), 1);
        assert_eq!(TreeNode::empty_container().depth(), 1);
    }

    #[test]
    fn given_tree_when_collecting_leaf_paths_then_in_order() {
        assert_eq!(
            sample().leaf_paths(),
            vec!["db.host", "db.ports", "debug", "extra"]
        );
    }

    #[test]
    fn given_duplicate_keys_when_building_container_then_keys_stay_unique() {
        let node = TreeNode::container([
            ("a", TreeNode::value(1)),
            ("b", TreeNode::value(2)),
            ("a", TreeNode::value(3)),
        ]);
        let children = node.children().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children.get_index(0).map(|(k, _)| k.as_str()), Some("a"));
        assert_eq!(children["a"], TreeNode::value(3));
    }

    #[test]
    fn given_very_deep_tree_when_dropped_then_does_not_overflow() {
        let mut node = TreeNode::value("leaf");
        for _ in 0..100_000 {
            node = TreeNode::container([("child", node)]);
        }
        assert_eq!(node.depth(), 100_001);
        drop(node);
    }

    #[test]
    fn given_tree_when_cloning_then_copy_is_equal_and_keeps_key_order() {
        let tree = sample();
        let copy = tree.clone();
        assert_eq!(copy, tree);
        assert_eq!(copy.leaf_paths(), tree.leaf_paths());
    }

    #[test]
    fn given_very_deep_tree_when_cloned_then_does_not_overflow() {
        let mut node = TreeNode::list([TreeNode::value("leaf")]);
        for _ in 0..100_000 {
            node = TreeNode::container([("child", node)]);
        }

        let copy = node.clone();

        assert_eq!(copy.depth(), 100_002);
        assert!(copy == node);
    }
}

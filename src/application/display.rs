//! Render configuration trees with `termtree` for debugging output.

use termtree::Tree;
use tracing::instrument;

use crate::application::source::Source;
use crate::config::Settings;
use crate::domain::TreeNode;

/// Turns a tree into a printable `termtree::Tree`.
///
/// Container children are labelled by key, list elements by `[index]`.
/// With `show_values` set, value leaves read `label = value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRenderer {
    pub show_values: bool,
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self { show_values: true }
    }
}

enum Step<'a> {
    Enter(String, &'a TreeNode),
    Exit(String, usize),
}

impl TreeRenderer {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            show_values: settings.display.show_values,
        }
    }

    #[instrument(level = "trace", skip(self, tree))]
    pub fn render(&self, root_label: &str, tree: &TreeNode) -> Tree<String> {
        let mut work = vec![Step::Enter(root_label.to_string(), tree)];
        let mut done: Vec<Tree<String>> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Enter(label, TreeNode::Value(value)) => {
                    let text = if self.show_values {
                        format!("{} = {}", label, value)
                    } else {
                        label
                    };
                    done.push(Tree::new(text));
                }
                Step::Enter(label, TreeNode::List(items)) => {
                    work.push(Step::Exit(label, items.len()));
                    for (i, child) in items.iter().enumerate().rev() {
                        work.push(Step::Enter(format!("[{}]", i), child));
                    }
                }
                Step::Enter(label, TreeNode::Container(children)) => {
                    work.push(Step::Exit(label, children.len()));
                    for (key, child) in children.iter().rev() {
                        work.push(Step::Enter(key.clone(), child));
                    }
                }
                Step::Exit(label, count) => {
                    let leaves = done.split_off(done.len() - count);
                    done.push(Tree::new(label).with_leaves(leaves));
                }
            }
        }

        done.pop().unwrap_or_else(|| Tree::new(root_label.to_string()))
    }
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for TreeNode {
    fn to_tree_string(&self) -> Tree<String> {
        TreeRenderer::default().render("<root>", self)
    }
}

impl TreeNodeConvert for Source {
    fn to_tree_string(&self) -> Tree<String> {
        TreeRenderer::default().render(&self.description(), self.tree())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_nested_tree_when_rendering_then_labels_keys_and_indices() {
        let tree = TreeNode::container([
            ("name", TreeNode::value("app")),
            (
                "ports",
                TreeNode::list([TreeNode::value(80), TreeNode::value(443)]),
            ),
        ]);

        let rendered = tree.to_tree_string();
        assert_eq!(rendered.root, "<root>");
        let labels: Vec<&str> = rendered.leaves.iter().map(|t| t.root.as_str()).collect();
        assert_eq!(labels, vec!["name = app", "ports"]);
        let ports: Vec<&str> = rendered.leaves[1]
            .leaves
            .iter()
            .map(|t| t.root.as_str())
            .collect();
        assert_eq!(ports, vec!["[0] = 80", "[1] = 443"]);
    }

    #[test]
    fn given_values_hidden_when_rendering_then_only_labels() {
        let tree = TreeNode::container([("secret", TreeNode::value("hunter2"))]);
        let rendered = TreeRenderer { show_values: false }.render("cfg", &tree);
        let text = rendered.to_string();
        assert!(text.contains("secret"));
        assert!(!text.contains("hunter2"));
    }
}

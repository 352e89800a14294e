use std::collections::HashSet;

use generational_arena::Index;
use termtree::Tree;

use crate::domain::arena::ViewTree;

/// Conversion into a printable `termtree` hierarchy.
pub trait TreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeDisplay for ViewTree {
    /// Collapsed nodes are marked with `[+]` and their subtree left out.
    /// A node already printed under another parent is marked with `*`.
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(
            tree: &ViewTree,
            node_idx: Index,
            seen: &mut HashSet<Index>,
        ) -> Option<Tree<String>> {
            let node = tree.get_node(node_idx)?;
            if !seen.insert(node_idx) {
                return Some(Tree::new(format!("{} *", node.data)));
            }
            if node.data.collapsed {
                return Some(Tree::new(format!("{} [+]", node.data)));
            }
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|&child| build_tree(tree, child, seen))
                .collect();
            Some(Tree::new(node.data.to_string()).with_leaves(leaves))
        }

        if self.is_empty() {
            return Tree::new("Empty tree".to_string());
        }
        let mut seen = HashSet::new();
        let leaves: Vec<_> = self
            .roots()
            .iter()
            .filter_map(|&root| build_tree(self, root, &mut seen))
            .collect();
        Tree::new(self.perspective().to_string()).with_leaves(leaves)
    }
}

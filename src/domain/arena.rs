use std::collections::{HashMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{NodeKind, Perspective};
use crate::domain::error::{DomainError, DomainResult};

/// Data payload for tree nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Entity id, unique within one tree
    pub id: String,
    /// Display name
    pub name: String,
    pub kind: NodeKind,
    /// Ancestor display names including this node, fixed at creation
    pub path_labels: Vec<String>,
    /// Subtree hidden from layout
    pub collapsed: bool,
}

impl NodeData {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            path_labels: vec![name.clone()],
            name,
            kind,
            collapsed: false,
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.kind)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// First parent the node was attached to, None for roots
    pub parent: Option<Index>,
    /// Child indices in first-seen order
    pub children: Vec<Index>,
}

/// Arena-backed view tree with an id → node table.
///
/// A node may be reachable from more than one parent (fan-in); it is still
/// stored once. The structure never contains a cycle.
#[derive(Debug)]
pub struct ViewTree {
    arena: Arena<TreeNode>,
    roots: Vec<Index>,
    root_set: HashSet<Index>,
    table: HashMap<String, Index>,
    /// Every `(parent, child)` link, for constant-time duplicate checks
    links: HashSet<(Index, Index)>,
    perspective: Perspective,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new(Perspective::default())
    }
}

impl ViewTree {
    pub fn new(perspective: Perspective) -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
            root_set: HashSet::new(),
            table: HashMap::new(),
            links: HashSet::new(),
            perspective,
        }
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    /// Store a new node and register its id. An existing id returns the existing index.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData) -> Index {
        if let Some(&idx) = self.table.get(&data.id) {
            return idx;
        }
        let id = data.id.clone();
        let idx = self.arena.insert(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.table.insert(id, idx);
        idx
    }

    /// Append `child` to `parent` unless already present or the link would close a cycle.
    ///
    /// Returns whether the link was added. The cycle search only runs when
    /// `child` already has children; a childless node cannot reach `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn link(&mut self, parent: Index, child: Index) -> bool {
        if parent == child || self.links.contains(&(parent, child)) {
            return false;
        }
        let child_has_children = self
            .arena
            .get(child)
            .is_some_and(|node| !node.children.is_empty());
        if child_has_children && self.reaches(child, parent) {
            return false;
        }
        let Some(parent_node) = self.arena.get_mut(parent) else {
            return false;
        };
        parent_node.children.push(child);
        self.links.insert((parent, child));
        if let Some(child_node) = self.arena.get_mut(child) {
            if child_node.parent.is_none() {
                child_node.parent = Some(parent);
            }
        }
        true
    }

    pub fn push_root(&mut self, idx: Index) {
        if self.root_set.insert(idx) {
            self.roots.push(idx);
        }
    }

    pub(crate) fn replace_roots(&mut self, roots: Vec<Index>) {
        self.root_set = roots.iter().copied().collect();
        self.roots = roots;
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, id: &str) -> Option<Index> {
        self.table.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.index_of(id).and_then(|idx| self.arena.get(idx))
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> DomainResult<&mut TreeNode> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()))?;
        self.arena
            .get_mut(idx)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()))
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn root_ids(&self) -> Vec<&str> {
        self.roots
            .iter()
            .filter_map(|&idx| self.arena.get(idx))
            .map(|node| node.data.id.as_str())
            .collect()
    }

    pub fn children_ids(&self, id: &str) -> Vec<&str> {
        self.get(id)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|&c| self.arena.get(c))
                    .map(|c| c.data.id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal over all roots, each node yielded once.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Ids of nodes without children, in pre-order.
    pub fn leaf_ids(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.id.as_str())
            .collect()
    }

    /// Distinct descendants of `id` (excluding itself).
    pub fn descendant_count(&self, id: &str) -> usize {
        self.descendants(id).len()
    }

    /// Distinct info/data catalog descendants of `id`; the value of its count badge.
    pub fn catalog_count(&self, id: &str) -> usize {
        self.descendants(id)
            .into_iter()
            .filter_map(|idx| self.arena.get(idx))
            .filter(|node| node.data.kind.is_catalog())
            .count()
    }

    fn descendants(&self, id: &str) -> Vec<Index> {
        let Some(start) = self.index_of(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<Index> = self
            .get_node(start)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            out.push(idx);
            if let Some(node) = self.get_node(idx) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Case-insensitive substring search over names, ids in pre-order.
    pub fn find_by_name(&self, query: &str) -> Vec<&str> {
        let needle = query.to_lowercase();
        self.iter()
            .filter(|(_, node)| node.data.name.to_lowercase().contains(&needle))
            .map(|(_, node)| node.data.id.as_str())
            .collect()
    }

    /// Whether `to` is reachable from `from` following child links.
    fn reaches(&self, from: Index, to: Index) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(idx) = stack.pop() {
            if idx == to {
                return true;
            }
            if !seen.insert(idx) {
                continue;
            }
            if let Some(node) = self.get_node(idx) {
                stack.extend(node.children.iter().copied());
            }
        }
        false
    }
}

pub struct TreeIterator<'a> {
    tree: &'a ViewTree,
    stack: Vec<Index>,
    seen: HashSet<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a ViewTree) -> Self {
        // Push roots in reverse order for left-to-right traversal
        let stack = tree.roots.iter().rev().copied().collect();
        Self {
            tree,
            stack,
            seen: HashSet::new(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if !self.seen.insert(current_idx) {
                continue;
            }
            if let Some(node) = self.tree.get_node(current_idx) {
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ViewTree {
        let mut tree = ViewTree::new(Perspective::Organization);
        let d = tree.insert_node(NodeData::new("d1", "Dept", NodeKind::Department));
        let p = tree.insert_node(NodeData::new("p1", "Proc", NodeKind::Process));
        let c = tree.insert_node(NodeData::new("c1", "Cat", NodeKind::InfoCatalog));
        tree.push_root(d);
        tree.link(d, p);
        tree.link(p, c);
        tree
    }

    #[test]
    fn given_duplicate_id_when_inserting_then_returns_existing_index() {
        let mut tree = sample();
        let before = tree.len();
        let idx = tree.insert_node(NodeData::new("p1", "Other", NodeKind::Process));

        assert_eq!(Some(idx), tree.index_of("p1"));
        assert_eq!(tree.len(), before);
        assert_eq!(tree.get("p1").unwrap().data.name, "Proc");
    }

    #[test]
    fn given_back_link_when_linking_then_cycle_is_refused() {
        let mut tree = sample();
        let d = tree.index_of("d1").unwrap();
        let c = tree.index_of("c1").unwrap();

        assert!(!tree.link(c, d));
        assert!(!tree.link(d, d));
        assert!(tree.children_ids("c1").is_empty());
    }

    #[test]
    fn given_existing_link_when_linking_again_then_no_duplicate_child() {
        let mut tree = sample();
        let d = tree.index_of("d1").unwrap();
        let p = tree.index_of("p1").unwrap();
        let c = tree.index_of("c1").unwrap();

        assert!(!tree.link(d, p));
        assert!(tree.link(d, c));
        assert!(!tree.link(d, c));
        assert_eq!(tree.children_ids("d1"), vec!["p1", "c1"]);
        assert_eq!(tree.get("c1").unwrap().parent, Some(p));
    }

    #[test]
    fn given_new_parent_below_subtree_when_linking_back_then_cycle_is_refused() {
        let mut tree = sample();
        let d = tree.index_of("d1").unwrap();
        let c = tree.index_of("c1").unwrap();
        let x = tree.insert_node(NodeData::new("x1", "Extra", NodeKind::DataCatalog));

        assert!(tree.link(c, x));
        assert!(!tree.link(x, d));
        assert!(tree.children_ids("x1").is_empty());
    }

    #[test]
    fn given_tree_when_querying_then_depth_leaves_and_counts_match() {
        let tree = sample();

        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_ids(), vec!["c1"]);
        assert_eq!(tree.descendant_count("d1"), 2);
        assert_eq!(tree.catalog_count("d1"), 1);
        assert_eq!(tree.catalog_count("missing"), 0);
        assert_eq!(tree.find_by_name("pro"), vec!["p1"]);
    }
}

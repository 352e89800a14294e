//! Layout adapter: turns the visible part of a view tree into positioned nodes and edges.
//!
//! Positions come from a pluggable [`LayoutOracle`]. The built-in
//! [`MindmapLayout`] grows depth-first to the right: each column sits
//! `h_gap` past its parent's right edge, sibling subtrees stack with `v_gap`
//! between them and a parent is centred on its children's block.
//!
//! Coordinates are top-left corners.

use std::collections::{BTreeMap, HashMap};

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::ViewTree;
use crate::domain::entities::NodeKind;

pub const DEFAULT_H_GAP: f64 = 40.0;
pub const DEFAULT_V_GAP: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
    pub width: f64,
    pub height: f64,
}

impl NodeSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Sizes per kind and spacing used by the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMetrics {
    pub h_gap: f64,
    pub v_gap: f64,
    pub sizes: BTreeMap<NodeKind, NodeSize>,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        let sizes = NodeKind::ALL
            .iter()
            .map(|&kind| (kind, default_size(kind)))
            .collect();
        Self {
            h_gap: DEFAULT_H_GAP,
            v_gap: DEFAULT_V_GAP,
            sizes,
        }
    }
}

fn default_size(kind: NodeKind) -> NodeSize {
    match kind {
        NodeKind::OrganizationRoot | NodeKind::BusinessDomainRoot => NodeSize::new(160.0, 48.0),
        NodeKind::Department | NodeKind::BusinessDomain => NodeSize::new(140.0, 40.0),
        NodeKind::Process | NodeKind::BusinessModel => NodeSize::new(140.0, 40.0),
        NodeKind::InfoCatalog => NodeSize::new(180.0, 40.0),
        NodeKind::DataCatalog => NodeSize::new(180.0, 32.0),
    }
}

impl NodeMetrics {
    /// Configured size of `kind`, falling back to the built-in table.
    pub fn size_of(&self, kind: NodeKind) -> NodeSize {
        self.sizes
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_size(kind))
    }
}

/// Visible structure handed to a layout oracle. Slots are in depth-first order.
#[derive(Debug, Clone, Default)]
pub struct LayoutForest {
    pub slots: Vec<ForestSlot>,
    pub roots: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ForestSlot {
    pub kind: NodeKind,
    pub depth: usize,
    /// Children placed under this slot, in order
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Positions every slot of a forest. Must return one position per slot.
pub trait LayoutOracle {
    fn position(&self, forest: &LayoutForest, metrics: &NodeMetrics) -> Vec<Position>;
}

/// Depth-first, horizontal, right-side mind map.
#[derive(Debug, Clone, Copy, Default)]
pub struct MindmapLayout;

impl LayoutOracle for MindmapLayout {
    fn position(&self, forest: &LayoutForest, metrics: &NodeMetrics) -> Vec<Position> {
        let mut block = vec![0.0; forest.slots.len()];
        for &root in &forest.roots {
            block_height(forest, metrics, root, &mut block);
        }

        let mut positions = vec![Position::default(); forest.slots.len()];
        let mut top = 0.0;
        for &root in &forest.roots {
            place(forest, metrics, root, 0.0, top, &block, &mut positions);
            top += block[root] + metrics.v_gap;
        }
        positions
    }
}

fn block_height(forest: &LayoutForest, metrics: &NodeMetrics, slot: usize, block: &mut [f64]) -> f64 {
    let own = metrics.size_of(forest.slots[slot].kind).height;
    let children = &forest.slots[slot].children;
    let stacked = if children.is_empty() {
        0.0
    } else {
        let sum: f64 = children
            .iter()
            .map(|&c| block_height(forest, metrics, c, block))
            .sum();
        sum + metrics.v_gap * (children.len() - 1) as f64
    };
    block[slot] = own.max(stacked);
    block[slot]
}

fn place(
    forest: &LayoutForest,
    metrics: &NodeMetrics,
    slot: usize,
    x: f64,
    top: f64,
    block: &[f64],
    positions: &mut [Position],
) {
    let size = metrics.size_of(forest.slots[slot].kind);
    positions[slot] = Position {
        x,
        y: top + (block[slot] - size.height) / 2.0,
    };

    let children = &forest.slots[slot].children;
    if children.is_empty() {
        return;
    }
    let stacked: f64 = children.iter().map(|&c| block[c]).sum::<f64>()
        + metrics.v_gap * (children.len() - 1) as f64;
    let child_x = x + size.width + metrics.h_gap;
    let mut child_top = top + (block[slot] - stacked) / 2.0;
    for &child in children {
        place(forest, metrics, child, child_x, child_top, block, positions);
        child_top += block[child] + metrics.v_gap;
    }
}

/// One positioned node, carrying a copy of its tree data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub parent_id: Option<String>,
    pub path_labels: Vec<String>,
    pub collapsed: bool,
    /// Number of direct children in the tree, hidden or not
    pub child_count: usize,
    /// Badge value: distinct catalog descendants
    pub catalog_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayoutEdge {
    pub source_id: String,
    pub target_id: String,
}

impl LayoutEdge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }

    /// Cell id of the edge on a graph surface.
    pub fn id(&self) -> String {
        format!("{}->{}", self.source_id, self.target_id)
    }
}

/// Output of one layout pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Lay out the visible part of `tree`.
///
/// Descendants of collapsed nodes are left out together with their edges. A
/// node reachable through several parents is placed once, at its first
/// depth-first occurrence; every other visible parent still gets an edge.
#[instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
pub fn layout(tree: &ViewTree, metrics: &NodeMetrics, oracle: &dyn LayoutOracle) -> Layout {
    let mut walk = VisibleWalk::default();
    for &root in tree.roots() {
        if !walk.slot_of.contains_key(&root) {
            let slot = walk.visit(tree, root, None, 0);
            walk.forest.roots.push(slot);
        }
    }

    let positions = oracle.position(&walk.forest, metrics);
    let nodes = walk
        .order
        .iter()
        .enumerate()
        .filter_map(|(slot, (idx, parent))| {
            let node = tree.get_node(*idx)?;
            let size = metrics.size_of(node.data.kind);
            let pos = positions.get(slot).copied().unwrap_or_default();
            Some(LayoutNode {
                id: node.data.id.clone(),
                name: node.data.name.clone(),
                kind: node.data.kind,
                x: pos.x,
                y: pos.y,
                width: size.width,
                height: size.height,
                parent_id: parent
                    .and_then(|p| tree.get_node(p))
                    .map(|p| p.data.id.clone()),
                path_labels: node.data.path_labels.clone(),
                collapsed: node.data.collapsed,
                child_count: node.children.len(),
                catalog_count: tree.catalog_count(&node.data.id),
            })
        })
        .collect();

    debug!(
        "layout: {} visible nodes, {} edges",
        walk.order.len(),
        walk.edges.len()
    );
    Layout {
        nodes,
        edges: walk.edges,
    }
}

/// Lay out with the default metrics and the mind map oracle.
pub fn layout_default(tree: &ViewTree) -> Layout {
    layout(tree, &NodeMetrics::default(), &MindmapLayout)
}

#[derive(Default)]
struct VisibleWalk {
    forest: LayoutForest,
    /// Arena index and placing parent per slot
    order: Vec<(Index, Option<Index>)>,
    slot_of: HashMap<Index, usize>,
    edges: Vec<LayoutEdge>,
}

impl VisibleWalk {
    fn visit(&mut self, tree: &ViewTree, idx: Index, parent: Option<Index>, depth: usize) -> usize {
        let slot = self.order.len();
        self.order.push((idx, parent));
        self.slot_of.insert(idx, slot);

        let Some(node) = tree.get_node(idx) else {
            self.forest.slots.push(ForestSlot {
                kind: NodeKind::InfoCatalog,
                depth,
                children: Vec::new(),
            });
            return slot;
        };
        self.forest.slots.push(ForestSlot {
            kind: node.data.kind,
            depth,
            children: Vec::new(),
        });

        if node.data.collapsed {
            return slot;
        }
        for &child in &node.children {
            let Some(child_node) = tree.get_node(child) else {
                continue;
            };
            self.edges
                .push(LayoutEdge::new(node.data.id.clone(), child_node.data.id.clone()));
            if !self.slot_of.contains_key(&child) {
                let child_slot = self.visit(tree, child, Some(idx), depth + 1);
                self.forest.slots[slot].children.push(child_slot);
            }
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arena::NodeData;
    use crate::domain::entities::Perspective;

    fn fork() -> ViewTree {
        // p1 -> (c1, c2)
        let mut tree = ViewTree::new(Perspective::Organization);
        let p = tree.insert_node(NodeData::new("p1", "Proc", NodeKind::Process));
        let c1 = tree.insert_node(NodeData::new("c1", "Cat1", NodeKind::InfoCatalog));
        let c2 = tree.insert_node(NodeData::new("c2", "Cat2", NodeKind::InfoCatalog));
        tree.push_root(p);
        tree.link(p, c1);
        tree.link(p, c2);
        tree
    }

    #[test]
    fn given_fork_when_laid_out_then_children_stack_right_of_parent() {
        let out = layout_default(&fork());

        let p = out.node("p1").unwrap();
        let c1 = out.node("c1").unwrap();
        let c2 = out.node("c2").unwrap();

        assert_eq!(c1.x, 140.0 + DEFAULT_H_GAP);
        assert_eq!(c2.x, c1.x);
        assert_eq!(c1.y, 0.0);
        assert_eq!(c2.y, 40.0 + DEFAULT_V_GAP);
        // parent centred on the 104-unit children block
        assert_eq!(p.y, (104.0 - 40.0) / 2.0);
        assert_eq!(c1.parent_id.as_deref(), Some("p1"));
        assert_eq!(p.catalog_count, 2);
    }

    #[test]
    fn given_two_roots_when_laid_out_then_roots_stack_vertically() {
        let mut tree = ViewTree::new(Perspective::Organization);
        let a = tree.insert_node(NodeData::new("a", "A", NodeKind::Department));
        let b = tree.insert_node(NodeData::new("b", "B", NodeKind::Department));
        tree.push_root(a);
        tree.push_root(b);

        let out = layout_default(&tree);

        assert_eq!(out.node("a").unwrap().y, 0.0);
        assert_eq!(out.node("b").unwrap().y, 40.0 + DEFAULT_V_GAP);
        assert!(out.edges.is_empty());
    }

    #[test]
    fn given_custom_size_when_laid_out_then_metrics_apply() {
        let mut metrics = NodeMetrics::default();
        metrics.sizes.insert(NodeKind::Process, NodeSize::new(10.0, 10.0));
        metrics.h_gap = 5.0;

        let out = layout(&fork(), &metrics, &MindmapLayout);

        assert_eq!(out.node("p1").unwrap().width, 10.0);
        assert_eq!(out.node("c1").unwrap().x, 15.0);
    }

    #[test]
    fn given_missing_size_entry_when_looking_up_then_falls_back_to_table() {
        let metrics = NodeMetrics {
            sizes: BTreeMap::new(),
            ..NodeMetrics::default()
        };
        assert_eq!(metrics.size_of(NodeKind::DataCatalog), NodeSize::new(180.0, 32.0));
    }
}

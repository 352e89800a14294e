//! Incremental reconciler: brings a live graph surface in line with a new layout.

use std::collections::BTreeMap;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::layout::{Layout, LayoutEdge, LayoutNode};

/// Identity of a cell on a graph surface.
pub type CellHandle = Index;

/// Live drawing surface holding node and edge cells.
///
/// Updating a node must keep the cell (and any transient state attached to
/// it, such as selection) and only replace its data, position and size.
pub trait GraphSurface {
    fn add_node(&mut self, node: &LayoutNode) -> CellHandle;

    /// Returns false when the handle no longer refers to a cell.
    fn update_node(&mut self, handle: CellHandle, node: &LayoutNode) -> bool;

    fn remove_node(&mut self, handle: CellHandle) -> bool;

    fn add_edge(&mut self, edge: &LayoutEdge, source: CellHandle, target: CellHandle) -> CellHandle;

    fn remove_edge(&mut self, handle: CellHandle) -> bool;
}

/// What a surface currently displays, by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedCellSet {
    nodes: BTreeMap<String, CellHandle>,
    edges: BTreeMap<String, CellHandle>,
}

impl RenderedCellSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<CellHandle> {
        self.nodes.get(id).copied()
    }

    pub fn edge(&self, id: &str) -> Option<CellHandle> {
        self.edges.get(id).copied()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Counters for one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub edges: usize,
    pub dropped_edges: usize,
}

/// Apply `next` to `surface`, given that `previous` is what it shows now.
///
/// Nodes are updated in place, inserted or removed; edges are always
/// replaced wholesale after the node phase. Edges whose endpoints are not on
/// the surface are dropped with a warning.
#[instrument(level = "debug", skip_all, fields(prev = previous.nodes.len(), next = next.nodes.len()))]
pub fn reconcile(
    previous: &RenderedCellSet,
    next: &Layout,
    surface: &mut dyn GraphSurface,
) -> (RenderedCellSet, ReconcileStats) {
    let mut stats = ReconcileStats::default();
    let mut cells = RenderedCellSet::new();

    for node in &next.nodes {
        let handle = match previous.nodes.get(&node.id) {
            Some(&handle) if surface.update_node(handle, node) => {
                stats.updated += 1;
                handle
            }
            _ => {
                stats.added += 1;
                surface.add_node(node)
            }
        };
        cells.nodes.insert(node.id.clone(), handle);
    }

    for (id, &handle) in &previous.nodes {
        if !cells.nodes.contains_key(id) {
            surface.remove_node(handle);
            stats.removed += 1;
        }
    }

    for &handle in previous.edges.values() {
        surface.remove_edge(handle);
    }

    for edge in &next.edges {
        match (cells.node(&edge.source_id), cells.node(&edge.target_id)) {
            (Some(source), Some(target)) => {
                let handle = surface.add_edge(edge, source, target);
                cells.edges.insert(edge.id(), handle);
                stats.edges += 1;
            }
            _ => {
                warn!("dropping edge {}: endpoint not on surface", edge.id());
                stats.dropped_edges += 1;
            }
        }
    }

    debug!(?stats, "reconciled");
    (cells, stats)
}

/// Owns the rendered cell set of one surface across passes.
#[derive(Debug, Default)]
pub struct Reconciler {
    cells: RenderedCellSet,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &RenderedCellSet {
        &self.cells
    }

    pub fn reconcile(&mut self, surface: &mut dyn GraphSurface, next: &Layout) -> ReconcileStats {
        let (cells, stats) = reconcile(&self.cells, next, surface);
        self.cells = cells;
        stats
    }
}

//! In-memory graph surface.
//!
//! Stands in for a rendering surface: cells live in generational arenas so a
//! handle stays valid exactly as long as its cell. Each cell carries a
//! `highlighted` flag as an example of surface-only state that must survive
//! in-place updates.

use generational_arena::Arena;
use tracing::trace;

use crate::domain::{CellHandle, GraphSurface, LayoutEdge, LayoutNode};

#[derive(Debug, Clone)]
pub struct SurfaceNode {
    pub data: LayoutNode,
    pub highlighted: bool,
    /// Number of in-place updates this cell has received
    pub revisions: usize,
}

#[derive(Debug, Clone)]
pub struct SurfaceEdge {
    pub data: LayoutEdge,
    pub source: CellHandle,
    pub target: CellHandle,
}

/// Counts of surface operations since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceOps {
    pub node_adds: usize,
    pub node_updates: usize,
    pub node_removes: usize,
    pub edge_adds: usize,
    pub edge_removes: usize,
}

#[derive(Debug, Default)]
pub struct InMemorySurface {
    nodes: Arena<SurfaceNode>,
    edges: Arena<SurfaceEdge>,
    ops: SurfaceOps,
}

impl InMemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, handle: CellHandle) -> Option<&SurfaceNode> {
        self.nodes.get(handle)
    }

    pub fn node_by_id(&self, id: &str) -> Option<(CellHandle, &SurfaceNode)> {
        self.nodes.iter().find(|(_, n)| n.data.id == id)
    }

    pub fn edge(&self, handle: CellHandle) -> Option<&SurfaceEdge> {
        self.edges.get(handle)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Sorted `source->target` ids of all edges.
    pub fn edge_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.edges.iter().map(|(_, e)| e.data.id()).collect();
        ids.sort();
        ids
    }

    pub fn ops(&self) -> SurfaceOps {
        self.ops
    }

    /// Mark a cell, as a user selection would.
    pub fn highlight(&mut self, handle: CellHandle) -> bool {
        match self.nodes.get_mut(handle) {
            Some(node) => {
                node.highlighted = true;
                true
            }
            None => false,
        }
    }
}

impl GraphSurface for InMemorySurface {
    fn add_node(&mut self, node: &LayoutNode) -> CellHandle {
        trace!("add node {}", node.id);
        self.ops.node_adds += 1;
        self.nodes.insert(SurfaceNode {
            data: node.clone(),
            highlighted: false,
            revisions: 0,
        })
    }

    fn update_node(&mut self, handle: CellHandle, node: &LayoutNode) -> bool {
        match self.nodes.get_mut(handle) {
            Some(cell) => {
                trace!("update node {}", node.id);
                cell.data = node.clone();
                cell.revisions += 1;
                self.ops.node_updates += 1;
                true
            }
            None => false,
        }
    }

    fn remove_node(&mut self, handle: CellHandle) -> bool {
        let removed = self.nodes.remove(handle).is_some();
        if removed {
            self.ops.node_removes += 1;
        }
        removed
    }

    fn add_edge(&mut self, edge: &LayoutEdge, source: CellHandle, target: CellHandle) -> CellHandle {
        self.ops.edge_adds += 1;
        self.edges.insert(SurfaceEdge {
            data: edge.clone(),
            source,
            target,
        })
    }

    fn remove_edge(&mut self, handle: CellHandle) -> bool {
        let removed = self.edges.remove(handle).is_some();
        if removed {
            self.ops.edge_removes += 1;
        }
        removed
    }
}

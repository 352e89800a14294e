//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod collapse;
pub mod display;
pub mod entities;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod reconcile;

pub use arena::{NodeData, TreeNode, ViewTree};
pub use builder::{build_tree, TreeBuilder};
pub use collapse::CollapseState;
pub use display::TreeDisplay;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use layout::{
    layout, layout_default, Layout, LayoutEdge, LayoutForest, LayoutNode, LayoutOracle,
    MindmapLayout, NodeMetrics, NodeSize, Position,
};
pub use normalize::{normalize, RecordFilter};
pub use reconcile::{reconcile, CellHandle, GraphSurface, Reconciler, ReconcileStats, RenderedCellSet};

//! Mind map view service
//!
//! Hosts one mounted view: owns its graph surface, the current tree and the
//! rendered cell set. Every state change runs build/layout/reconcile as one
//! synchronous sequence, so the surface never reflects a half-applied change.
//!
//! Fetches are tracked with tickets. Switching perspective or unmounting
//! invalidates outstanding tickets and their results are discarded.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::services::CatalogService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{
    layout, CollapseState, DomainError, GraphSurface, Layout, LayoutNode, LayoutOracle,
    MindmapLayout, NodeKind, NodeMetrics, Perspective, RawCatalogRecord, ReconcileStats,
    Reconciler, RenderedCellSet, TreeBuilder, ViewTree,
};
use crate::infrastructure::traits::{ViewState, ViewStateCache};

/// Host callback receiving `(node id, node kind, node data)`.
pub type NodeCallback = Box<dyn FnMut(&str, NodeKind, &LayoutNode)>;

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    perspective: Perspective,
}

impl FetchTicket {
    pub fn perspective(&self) -> Perspective {
        self.perspective
    }
}

/// Static view configuration.
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub perspective: Perspective,
    pub builder: TreeBuilder,
    pub metrics: NodeMetrics,
}

impl ViewOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            perspective: settings.default_perspective,
            builder: settings.tree_builder(),
            metrics: settings.layout.clone(),
        }
    }
}

/// One mounted mind map view over a graph surface `S`.
pub struct ViewService<S: GraphSurface> {
    builder: TreeBuilder,
    metrics: NodeMetrics,
    oracle: Box<dyn LayoutOracle>,
    cache: Option<Arc<dyn ViewStateCache>>,
    on_node_click: Option<NodeCallback>,
    on_badge_click: Option<NodeCallback>,
    perspective: Perspective,
    generation: u64,
    surface: Option<S>,
    reconciler: Reconciler,
    tree: Option<ViewTree>,
    layout: Option<Layout>,
    selected: Option<String>,
    restore: Option<CollapseState>,
}

impl<S: GraphSurface> fmt::Debug for ViewService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewService")
            .field("perspective", &self.perspective)
            .field("generation", &self.generation)
            .field("mounted", &self.surface.is_some())
            .field("nodes", &self.tree.as_ref().map(ViewTree::len))
            .field("selected", &self.selected)
            .finish()
    }
}

impl<S: GraphSurface> ViewService<S> {
    /// Take exclusive ownership of `surface` and start an empty view.
    pub fn mount(surface: S, options: ViewOptions) -> Self {
        debug!("mount: perspective={}", options.perspective);
        Self {
            builder: options.builder,
            metrics: options.metrics,
            oracle: Box::new(MindmapLayout),
            cache: None,
            on_node_click: None,
            on_badge_click: None,
            perspective: options.perspective,
            generation: 0,
            surface: Some(surface),
            reconciler: Reconciler::new(),
            tree: None,
            layout: None,
            selected: None,
            restore: None,
        }
    }

    /// Attach a state cache.
    ///
    /// A cached state for the same perspective is applied after the next build.
    pub fn with_cache(mut self, cache: Arc<dyn ViewStateCache>) -> Self {
        match cache.load() {
            Some(state) if state.perspective == self.perspective => {
                debug!("restoring cached view: {} collapsed", state.collapsed.len());
                self.restore = Some(state.collapsed);
                self.selected = state.selected;
            }
            Some(state) => {
                debug!("ignoring cached view for {}", state.perspective);
            }
            None => {}
        }
        self.cache = Some(cache);
        self
    }

    pub fn with_oracle(mut self, oracle: Box<dyn LayoutOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn on_node_click(mut self, callback: impl FnMut(&str, NodeKind, &LayoutNode) + 'static) -> Self {
        self.on_node_click = Some(Box::new(callback));
        self
    }

    pub fn on_badge_click(mut self, callback: impl FnMut(&str, NodeKind, &LayoutNode) + 'static) -> Self {
        self.on_badge_click = Some(Box::new(callback));
        self
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn tree(&self) -> Option<&ViewTree> {
        self.tree.as_ref()
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn cells(&self) -> &RenderedCellSet {
        self.reconciler.cells()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Start a fetch for the current perspective. Any older ticket becomes stale.
    pub fn begin_fetch(&mut self) -> ApplicationResult<FetchTicket> {
        self.ensure_mounted()?;
        self.generation += 1;
        Ok(FetchTicket {
            generation: self.generation,
            perspective: self.perspective,
        })
    }

    /// Deliver the complete record list for `ticket`.
    ///
    /// Returns `Ok(None)` and leaves the view untouched when the ticket is stale.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        records: &[RawCatalogRecord],
    ) -> ApplicationResult<Option<ReconcileStats>> {
        if !self.is_mounted() || ticket.generation != self.generation {
            debug!(
                "discarding stale fetch result (ticket {}, current {})",
                ticket.generation, self.generation
            );
            return Ok(None);
        }
        self.rebuild(records).map(Some)
    }

    /// Build from `records` right away, superseding any in-flight fetch.
    pub fn load(&mut self, records: &[RawCatalogRecord]) -> ApplicationResult<ReconcileStats> {
        self.begin_fetch()?;
        self.rebuild(records)
    }

    /// Fetch the full record set and render it.
    ///
    /// On fetch failure the view renders as empty and the error is returned
    /// for the host to report.
    pub fn refresh(&mut self, catalog: &CatalogService) -> ApplicationResult<ReconcileStats> {
        let ticket = self.begin_fetch()?;
        match catalog.fetch_all_catalog_records(ticket.perspective) {
            Ok(records) => self.rebuild(&records),
            Err(e) => {
                info!("fetch failed, showing empty view: {e}");
                self.rebuild(&[])?;
                Err(e)
            }
        }
    }

    /// Change the grouping axis. Clears the view and invalidates in-flight fetches.
    pub fn switch_perspective(&mut self, perspective: Perspective) -> ApplicationResult<()> {
        self.ensure_mounted()?;
        if perspective == self.perspective {
            return Ok(());
        }
        info!("switch perspective: {} -> {}", self.perspective, perspective);
        self.generation += 1;
        self.perspective = perspective;
        self.restore = None;
        self.selected = None;
        self.tree = None;
        self.layout = None;
        self.clear_surface()
    }

    /// Flip one node's collapsed flag and run exactly one layout/reconcile pass.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle(&mut self, id: &str) -> ApplicationResult<ReconcileStats> {
        self.ensure_mounted()?;
        let tree = self.tree.as_mut().ok_or(DomainError::NotLaidOut)?;
        tree.toggle_collapse(id)?;
        self.render()
    }

    /// Select a visible node and notify the host.
    pub fn click_node(&mut self, id: &str) -> ApplicationResult<()> {
        self.ensure_mounted()?;
        let node = Self::visible_node(&self.layout, id)?;
        self.selected = Some(node.id.clone());
        if let Some(callback) = self.on_node_click.as_mut() {
            callback(&node.id, node.kind, node);
        }
        Ok(())
    }

    /// Notify the host that a node's count badge was clicked.
    pub fn click_badge(&mut self, id: &str) -> ApplicationResult<()> {
        self.ensure_mounted()?;
        let node = Self::visible_node(&self.layout, id)?;
        if let Some(callback) = self.on_badge_click.as_mut() {
            callback(&node.id, node.kind, node);
        }
        Ok(())
    }

    /// Save state to the cache and release the surface.
    ///
    /// Afterwards every operation fails with [`ApplicationError::Unmounted`]
    /// and late fetch results are discarded.
    pub fn unmount(&mut self) -> ApplicationResult<()> {
        self.ensure_mounted()?;
        if let Some(cache) = &self.cache {
            let collapsed = match &self.tree {
                Some(tree) => tree.collapse_state(),
                None => self.restore.clone().unwrap_or_default(),
            };
            cache.save(ViewState {
                perspective: self.perspective,
                collapsed,
                selected: self.selected.clone(),
            });
        }
        self.generation += 1;
        self.surface = None;
        self.tree = None;
        self.layout = None;
        self.reconciler = Reconciler::new();
        self.on_node_click = None;
        self.on_badge_click = None;
        debug!("unmounted");
        Ok(())
    }

    fn ensure_mounted(&self) -> ApplicationResult<()> {
        if self.is_mounted() {
            Ok(())
        } else {
            Err(ApplicationError::Unmounted)
        }
    }

    fn visible_node<'a>(layout: &'a Option<Layout>, id: &str) -> ApplicationResult<&'a LayoutNode> {
        let layout = layout.as_ref().ok_or(DomainError::NotLaidOut)?;
        layout
            .node(id)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()).into())
    }

    fn rebuild(&mut self, records: &[RawCatalogRecord]) -> ApplicationResult<ReconcileStats> {
        let carried = self
            .tree
            .as_ref()
            .filter(|tree| tree.perspective() == self.perspective)
            .map(ViewTree::collapse_state);
        let mut tree = self.builder.build(records, self.perspective);
        if let Some(state) = self.restore.take().or(carried) {
            tree.apply_collapse_state(&state);
        }
        if let Some(selected) = &self.selected {
            if tree.get(selected).is_none() {
                self.selected = None;
            }
        }
        info!(
            "built {} view: {} nodes, {} roots",
            self.perspective,
            tree.len(),
            tree.roots().len()
        );
        self.tree = Some(tree);
        self.render()
    }

    fn render(&mut self) -> ApplicationResult<ReconcileStats> {
        let surface = self.surface.as_mut().ok_or(ApplicationError::Unmounted)?;
        let tree = self.tree.as_ref().ok_or(DomainError::NotLaidOut)?;
        let next = layout(tree, &self.metrics, self.oracle.as_ref());
        let stats = self.reconciler.reconcile(surface, &next);
        self.layout = Some(next);
        Ok(stats)
    }

    fn clear_surface(&mut self) -> ApplicationResult<()> {
        let surface = self.surface.as_mut().ok_or(ApplicationError::Unmounted)?;
        self.reconciler.reconcile(surface, &Layout::default());
        Ok(())
    }
}

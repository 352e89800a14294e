//! Collapse/expand state of view tree nodes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::arena::ViewTree;
use crate::domain::error::DomainResult;

/// Snapshot of which node ids are collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollapseState {
    collapsed: BTreeSet<String>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>) {
        self.collapsed.insert(id.into());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.collapsed.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CollapseState {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            collapsed: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl ViewTree {
    /// Flip the collapsed flag of one node and return the new value.
    ///
    /// Descendant flags are untouched, so re-expanding restores their last state.
    pub fn toggle_collapse(&mut self, id: &str) -> DomainResult<bool> {
        let node = self.get_mut(id)?;
        node.data.collapsed = !node.data.collapsed;
        debug!("toggle {id}: collapsed={}", node.data.collapsed);
        Ok(node.data.collapsed)
    }

    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) -> DomainResult<()> {
        self.get_mut(id)?.data.collapsed = collapsed;
        Ok(())
    }

    pub fn is_collapsed(&self, id: &str) -> Option<bool> {
        self.get(id).map(|node| node.data.collapsed)
    }

    pub fn expand_all(&mut self) {
        let ids: Vec<String> = self.iter().map(|(_, n)| n.data.id.clone()).collect();
        for id in ids {
            if let Ok(node) = self.get_mut(&id) {
                node.data.collapsed = false;
            }
        }
    }

    pub fn collapse_state(&self) -> CollapseState {
        self.iter()
            .filter(|(_, node)| node.data.collapsed)
            .map(|(_, node)| node.data.id.clone())
            .collect()
    }

    /// Restore a snapshot. Ids missing from this tree are ignored; nodes not
    /// in the snapshot are expanded.
    pub fn apply_collapse_state(&mut self, state: &CollapseState) {
        let ids: Vec<String> = self.iter().map(|(_, n)| n.data.id.clone()).collect();
        for id in ids {
            let collapsed = state.contains(&id);
            if let Ok(node) = self.get_mut(&id) {
                node.data.collapsed = collapsed;
            }
        }
    }
}

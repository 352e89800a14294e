//! Tree builder folding flat catalog records into a deduplicated view tree.

use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeData, ViewTree};
use crate::domain::entities::{Perspective, RawCatalogRecord};
use crate::domain::normalize::{normalize, RecordFilter};

/// Constructs view trees from catalog records.
///
/// Every call starts from an empty node table; nothing is retained between builds.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    filter: RecordFilter,
    root_label: Option<String>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Hang all top-level nodes under one synthetic root with this label.
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = Some(label.into());
        self
    }

    /// Fold `records` into a tree for `perspective`.
    ///
    /// Never fails: records rejected by the filter and reference slots without
    /// an id or a name are skipped, the tree just gets smaller.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build(&self, records: &[RawCatalogRecord], perspective: Perspective) -> ViewTree {
        let mut tree = ViewTree::new(perspective);
        let mut skipped = 0usize;

        for record in records {
            if !self.filter.accepts(record, perspective) {
                skipped += 1;
                continue;
            }

            let mut parent = None;
            for reference in normalize(record, perspective) {
                let idx = match tree.index_of(&reference.id) {
                    Some(existing) => existing,
                    None => {
                        let mut path_labels = parent
                            .and_then(|p| tree.get_node(p))
                            .map(|p| p.data.path_labels.clone())
                            .unwrap_or_default();
                        path_labels.push(reference.name.clone());
                        tree.insert_node(NodeData {
                            id: reference.id,
                            name: reference.name,
                            kind: reference.kind,
                            path_labels,
                            collapsed: false,
                        })
                    }
                };

                match parent {
                    Some(p) => {
                        if !tree.link(p, idx) {
                            debug!("record {}: link already present or cyclic, kept existing structure", record.id);
                        }
                    }
                    None => tree.push_root(idx),
                }
                parent = Some(idx);
            }
        }

        if let Some(label) = &self.root_label {
            wrap_roots(&mut tree, label);
        }

        debug!(
            "built tree: {} nodes, {} roots, {} records skipped",
            tree.len(),
            tree.roots().len(),
            skipped
        );
        tree
    }
}

fn wrap_roots(tree: &mut ViewTree, label: &str) {
    if tree.is_empty() {
        return;
    }
    let perspective = tree.perspective();
    let id = format!("{}_root", perspective.as_str());
    if tree.index_of(&id).is_some() {
        warn!("synthetic root id {id} is taken by a record, keeping top-level nodes as roots");
        return;
    }
    let top: Vec<_> = tree.roots().to_vec();
    let root = tree.insert_node(NodeData::new(id, label, perspective.root_kind()));
    for idx in top {
        tree.link(root, idx);
    }
    tree.replace_roots(vec![root]);
}

/// Build with the default record filter.
pub fn build_tree(records: &[RawCatalogRecord], perspective: Perspective) -> ViewTree {
    TreeBuilder::new().build(records, perspective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NodeKind;

    #[test]
    fn given_root_label_when_building_then_single_synthetic_root() {
        let records = vec![
            RawCatalogRecord::new("r1", "C1").with_department("d1", "Dept1"),
            RawCatalogRecord::new("r2", "C2").with_department("d2", "Dept2"),
        ];

        let tree = TreeBuilder::new()
            .with_root_label("Organization")
            .build(&records, Perspective::Organization);

        assert_eq!(tree.root_ids(), vec!["organization_root"]);
        assert_eq!(
            tree.get("organization_root").unwrap().data.kind,
            NodeKind::OrganizationRoot
        );
        assert_eq!(tree.children_ids("organization_root"), vec!["d1", "d2"]);
    }

    #[test]
    fn given_record_using_root_id_when_wrapping_then_roots_are_left_alone() {
        let records = vec![
            RawCatalogRecord::new("r1", "C1").with_department("d1", "Dept1"),
            RawCatalogRecord::new("r2", "C2").with_department("organization_root", "Dept2"),
        ];

        let tree = TreeBuilder::new()
            .with_root_label("Organization")
            .build(&records, Perspective::Organization);

        assert_eq!(tree.root_ids(), vec!["d1", "organization_root"]);
        assert_eq!(tree.children_ids("organization_root"), vec!["r2"]);
        assert_eq!(
            tree.get("organization_root").unwrap().data.kind,
            NodeKind::Department
        );
    }

    #[test]
    fn given_root_label_and_no_records_when_building_then_stays_empty() {
        let tree = TreeBuilder::new()
            .with_root_label("Organization")
            .build(&[], Perspective::Organization);
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
    }
}

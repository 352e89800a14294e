//! Record normalizer: flattens a catalog record into ordered references.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::entities::{CatalogRef, NodeKind, Perspective, RawCatalogRecord, Reference};

/// Which records take part in a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    /// Skip records whose first department entry has no name (organization perspective only).
    pub require_department_name: bool,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            require_department_name: true,
        }
    }
}

impl RecordFilter {
    /// Accept every record.
    pub fn permissive() -> Self {
        Self {
            require_department_name: false,
        }
    }

    pub fn accepts(&self, record: &RawCatalogRecord, perspective: Perspective) -> bool {
        if self.require_department_name && perspective == Perspective::Organization {
            let named = record
                .department
                .first()
                .and_then(Reference::display_name)
                .is_some();
            if !named {
                debug!("skipping record {}: first department has no name", record.id);
                return false;
            }
        }
        true
    }
}

/// Extract every reference of `record` in the traversal order of `perspective`.
///
/// A slot is emitted only when it has both an id and a name; anything else is
/// omitted and logged.
pub fn normalize(record: &RawCatalogRecord, perspective: Perspective) -> Vec<CatalogRef> {
    let mut refs = Vec::new();

    match perspective {
        Perspective::Organization => {
            for dept in &record.department {
                push_ref(&mut refs, NodeKind::Department, dept, &record.id);
            }
        }
        Perspective::BusinessDomain => {
            if let Some(domain) = &record.business_domain {
                push_ref(&mut refs, NodeKind::BusinessDomain, domain, &record.id);
            }
        }
    }

    if let Some(process) = &record.main_business {
        push_ref(&mut refs, NodeKind::Process, process, &record.id);
    }
    if let Some(model) = &record.business_model {
        push_ref(&mut refs, NodeKind::BusinessModel, model, &record.id);
    }

    if record.id.trim().is_empty() {
        debug!("record without id, dropping its own slot");
    } else if record.name.trim().is_empty() {
        debug!("record {}: no name, dropping its own slot", record.id);
    } else {
        refs.push(CatalogRef::new(
            NodeKind::InfoCatalog,
            record.id.clone(),
            record.name.clone(),
        ));
    }

    for catalog in &record.data_catalogs {
        push_ref(&mut refs, NodeKind::DataCatalog, catalog, &record.id);
    }

    refs
}

fn push_ref(refs: &mut Vec<CatalogRef>, kind: NodeKind, reference: &Reference, record_id: &str) {
    match (reference.resolved_id(), reference.display_name()) {
        (Some(id), Some(name)) => refs.push(CatalogRef::new(kind, id, name)),
        (Some(id), None) => debug!("record {record_id}: {kind} {id} has no name, omitted"),
        (None, _) => debug!("record {record_id}: {kind} reference without id, omitted"),
    }
}

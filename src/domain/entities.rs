//! Domain entities: catalog records and the vocabulary of the tree

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Grouping axis of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    /// Department chain → process → business model → catalogs
    #[default]
    Organization,
    /// Business domain → process → business model → catalogs
    BusinessDomain,
}

impl Perspective {
    /// Short name used for file names and CLI values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Perspective::Organization => "organization",
            Perspective::BusinessDomain => "business_domain",
        }
    }

    /// Kind of the synthetic root node for this perspective.
    pub fn root_kind(&self) -> NodeKind {
        match self {
            Perspective::Organization => NodeKind::OrganizationRoot,
            Perspective::BusinessDomain => NodeKind::BusinessDomainRoot,
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Perspective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "org" | "organization" => Ok(Perspective::Organization),
            "domain" | "business_domain" | "business-domain" => Ok(Perspective::BusinessDomain),
            other => Err(format!("unknown perspective: {other}")),
        }
    }
}

/// Closed set of node kinds in a view tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    OrganizationRoot,
    BusinessDomainRoot,
    Department,
    Process,
    BusinessModel,
    InfoCatalog,
    DataCatalog,
    BusinessDomain,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        NodeKind::OrganizationRoot,
        NodeKind::BusinessDomainRoot,
        NodeKind::Department,
        NodeKind::Process,
        NodeKind::BusinessModel,
        NodeKind::InfoCatalog,
        NodeKind::DataCatalog,
        NodeKind::BusinessDomain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::OrganizationRoot => "organization_root",
            NodeKind::BusinessDomainRoot => "business_domain_root",
            NodeKind::Department => "department",
            NodeKind::Process => "process",
            NodeKind::BusinessModel => "business_model",
            NodeKind::InfoCatalog => "info_catalog",
            NodeKind::DataCatalog => "data_catalog",
            NodeKind::BusinessDomain => "business_domain",
        }
    }

    /// Catalog kinds are counted by the node-count badge.
    pub fn is_catalog(&self) -> bool {
        matches!(self, NodeKind::InfoCatalog | NodeKind::DataCatalog)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{id, name}` pair as delivered by the backend. Either side may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Reference {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
        }
    }

    /// Non-empty name, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }

    /// Non-empty id, if any.
    pub fn resolved_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|i| !i.trim().is_empty())
    }
}

/// One catalog entity as fetched from the backend.
///
/// Every reference slot is explicitly typed; absent slots are `None` or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCatalogRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Department chain, outermost first
    #[serde(default, alias = "main_business_departments")]
    pub department: Vec<Reference>,
    #[serde(default)]
    pub main_business: Option<Reference>,
    #[serde(default)]
    pub business_model: Option<Reference>,
    #[serde(default)]
    pub business_domain: Option<Reference>,
    /// Linked data catalogs (sub-catalogs)
    #[serde(default, alias = "data_catalog")]
    pub data_catalogs: Vec<Reference>,
}

impl RawCatalogRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_department(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.department.push(Reference::new(id, name));
        self
    }

    pub fn with_main_business(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.main_business = Some(Reference::new(id, name));
        self
    }

    pub fn with_business_model(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.business_model = Some(Reference::new(id, name));
        self
    }

    pub fn with_business_domain(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.business_domain = Some(Reference::new(id, name));
        self
    }

    pub fn with_data_catalog(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.data_catalogs.push(Reference::new(id, name));
        self
    }
}

/// A resolved `(kind, id, name)` reference extracted from a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogRef {
    pub kind: NodeKind,
    pub id: String,
    pub name: String,
}

impl CatalogRef {
    pub fn new(kind: NodeKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
        }
    }
}

//! I/O boundary traits for testability
//!
//! These traits abstract external collaborators (filesystem, catalog record
//! source, view-state cache), allowing services to be tested with in-memory
//! implementations.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CollapseState, Perspective, RawCatalogRecord};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Canonicalize path (resolve symlinks, make absolute).
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// One page of catalog records plus the continuation token, if more follow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub records: Vec<RawCatalogRecord>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Paged source of catalog records for a perspective.
pub trait CatalogSource: Send + Sync {
    /// Fetch the page following `continuation` (`None` for the first page).
    fn fetch_page(
        &self,
        perspective: Perspective,
        continuation: Option<&str>,
    ) -> io::Result<CatalogPage>;
}

/// Cached view state carried across view lifetimes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub perspective: Perspective,
    pub collapsed: CollapseState,
    pub selected: Option<String>,
}

/// Caller-supplied store for the last view state.
pub trait ViewStateCache: Send + Sync {
    fn load(&self) -> Option<ViewState>;

    fn save(&self, state: ViewState);
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}

/// Page file content: a bare record array or a `{records, next}` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageFile {
    Records(Vec<RawCatalogRecord>),
    Page(CatalogPage),
}

/// Reads record pages from JSON files.
///
/// With a directory, the first page is `<dir>/<perspective>.json` and a
/// continuation token `t` maps to `<dir>/<perspective>.t.json`. With a file,
/// the file is the first page for every perspective and `t` maps to the
/// sibling `<stem>.t.json`.
pub struct JsonFileCatalogSource {
    fs: Arc<dyn FileSystem>,
    location: PathBuf,
}

impl JsonFileCatalogSource {
    pub fn new(fs: Arc<dyn FileSystem>, location: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            location: location.into(),
        }
    }

    fn page_path(&self, perspective: Perspective, continuation: Option<&str>) -> PathBuf {
        if self.fs.is_dir(&self.location) {
            let stem = perspective.as_str();
            return match continuation {
                None => self.location.join(format!("{stem}.json")),
                Some(token) => self.location.join(format!("{stem}.{token}.json")),
            };
        }
        match continuation {
            None => self.location.clone(),
            Some(token) => {
                let stem = self
                    .location
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.location.with_file_name(format!("{stem}.{token}.json"))
            }
        }
    }
}

impl CatalogSource for JsonFileCatalogSource {
    fn fetch_page(
        &self,
        perspective: Perspective,
        continuation: Option<&str>,
    ) -> io::Result<CatalogPage> {
        let path = self.page_path(perspective, continuation);
        debug!("fetch_page: {}", path.display());
        let content = self.fs.read_to_string(&path).map_err(|e| {
            io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
        })?;
        let page: PageFile = serde_json::from_str(&content).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("{}: {}", path.display(), e))
        })?;
        Ok(match page {
            PageFile::Records(records) => CatalogPage {
                records,
                next: None,
            },
            PageFile::Page(page) => page,
        })
    }
}

/// In-memory paged source, keyed by perspective.
#[derive(Debug, Default)]
pub struct InMemoryCatalogSource {
    pages: HashMap<Perspective, Vec<Vec<RawCatalogRecord>>>,
    failing: bool,
}

impl InMemoryCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page for `perspective`. Tokens are the page numbers.
    pub fn with_page(mut self, perspective: Perspective, records: Vec<RawCatalogRecord>) -> Self {
        self.pages.entry(perspective).or_default().push(records);
        self
    }

    /// Every fetch fails with a connection error.
    pub fn failing() -> Self {
        Self {
            pages: HashMap::new(),
            failing: true,
        }
    }
}

impl CatalogSource for InMemoryCatalogSource {
    fn fetch_page(
        &self,
        perspective: Perspective,
        continuation: Option<&str>,
    ) -> io::Result<CatalogPage> {
        if self.failing {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "catalog backend unavailable",
            ));
        }
        let page_no = match continuation {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "bad token"))?,
        };
        let pages = self.pages.get(&perspective).map(Vec::as_slice).unwrap_or(&[]);
        let records = pages.get(page_no).cloned().unwrap_or_default();
        let next = (page_no + 1 < pages.len()).then(|| (page_no + 1).to_string());
        Ok(CatalogPage { records, next })
    }
}

/// Process-local view-state cache.
#[derive(Debug, Default)]
pub struct InMemoryViewStateCache {
    state: Mutex<Option<ViewState>>,
}

impl InMemoryViewStateCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewStateCache for InMemoryViewStateCache {
    fn load(&self) -> Option<ViewState> {
        self.state.lock().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, state: ViewState) {
        if let Ok(mut guard) = self.state.lock() {
            *guard = Some(state);
        }
    }
}

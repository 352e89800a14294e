//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::{CatalogService, ViewOptions, ViewService};
use crate::application::IoResultExt;
use crate::config::Settings;
use crate::domain::{GraphSurface, Perspective};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{
    CatalogSource, FileSystem, InMemoryViewStateCache, JsonFileCatalogSource, RealFileSystem,
    ViewStateCache,
};

/// Expand `~` and environment variables in a path string.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(
        shellexpand::full(path)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| path.to_string()),
    )
}

/// Container holding settings and shared collaborators.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// View state shared by all views mounted from this container
    pub cache: Arc<dyn ViewStateCache>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(InMemoryViewStateCache::new()),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        cache: Arc<dyn ViewStateCache>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs, cache }
    }

    /// JSON record source at `location` (file or directory).
    pub fn json_source(&self, location: &str) -> InfraResult<Arc<dyn CatalogSource>> {
        let path = expand_path(location);
        if !self.fs.exists(&path) {
            return Err(InfraError::SourceNotFound(path));
        }
        let path = self
            .fs
            .canonicalize(&path)
            .with_path_context("resolve record source", &path)?;
        debug!("record source: {}", path.display());
        Ok(Arc::new(JsonFileCatalogSource::new(self.fs.clone(), path)))
    }

    pub fn catalog_service(&self, source: Arc<dyn CatalogSource>) -> CatalogService {
        CatalogService::new(source, self.settings.fetch.max_pages)
    }

    /// Mount a view on `surface`, optionally overriding the configured perspective.
    pub fn mount_view<S: GraphSurface>(
        &self,
        surface: S,
        perspective: Option<Perspective>,
    ) -> ViewService<S> {
        let mut options = ViewOptions::from_settings(&self.settings);
        if let Some(perspective) = perspective {
            options.perspective = perspective;
        }
        ViewService::mount(surface, options).with_cache(self.cache.clone())
    }
}

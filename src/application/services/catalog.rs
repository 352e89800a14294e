//! Catalog record service
//!
//! Assembles the complete record list for a perspective from a paged source.
//! Partial pages are never handed out: callers get the full list or an error.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Perspective, RawCatalogRecord};
use crate::infrastructure::traits::CatalogSource;

/// Service fetching complete record sets.
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    max_pages: usize,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(source: Arc<dyn CatalogSource>, max_pages: usize) -> Self {
        Self { source, max_pages }
    }

    /// Follow continuation tokens until exhausted and return every record.
    #[instrument(level = "debug", skip(self))]
    pub fn fetch_all_catalog_records(
        &self,
        perspective: Perspective,
    ) -> ApplicationResult<Vec<RawCatalogRecord>> {
        let mut records = Vec::new();
        let mut continuation: Option<String> = None;
        let mut pages = 0usize;

        loop {
            if pages >= self.max_pages {
                return Err(ApplicationError::PageLimit {
                    limit: self.max_pages,
                });
            }
            let page = self
                .source
                .fetch_page(perspective, continuation.as_deref())
                .map_err(|e| ApplicationError::Fetch {
                    message: e.to_string(),
                })?;
            pages += 1;
            debug!("page {}: {} records", pages, page.records.len());
            records.extend(page.records);

            match page.next {
                Some(token) if continuation.as_deref() != Some(token.as_str()) => {
                    continuation = Some(token);
                }
                Some(token) => {
                    return Err(ApplicationError::Fetch {
                        message: format!("source repeated continuation token {token}"),
                    });
                }
                None => break,
            }
        }

        debug!("fetched {} records in {} pages", records.len(), pages);
        Ok(records)
    }
}

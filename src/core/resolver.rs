//! URL to package resolution.
//!
//! Resolution consults the single-slot cache first. On a miss every cataloged
//! store is opened read-only in turn, its package read, and the store closed again;
//! stores whose root URL prefixes the candidate (verbatim or with the
//! protocol stripped on both sides) match. The first match in catalog order
//! wins and is written back to the cache. Misses are never cached.

use crate::core::cache::{Cache, CacheEntry};
use crate::core::catalog::Catalog;
use crate::core::error::FeedpackError;
use crate::core::naming;
use crate::core::store::{Package, Store};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreMatch {
    pub store_id: String,
    pub store_name: String,
    pub package: Package,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivePackage {
    pub store_id: String,
    pub package: Package,
    /// True when served from the cache without opening any store.
    #[serde(skip)]
    pub cached: bool,
}

pub struct Resolver {
    catalog: Arc<dyn Catalog>,
    cache: Arc<dyn Cache>,
}

impl Resolver {
    pub fn new(catalog: Arc<dyn Catalog>, cache: Arc<dyn Cache>) -> Self {
        Self { catalog, cache }
    }

    /// Read one store's package, closing the store whatever the outcome.
    fn read_package(&self, store_name: &str) -> Result<Option<(String, Package)>, FeedpackError> {
        let mut store = Store::from_store_name(self.catalog.clone(), store_name)?;
        store.open_read_only()?;
        let package = store.get_package();
        store.close();
        Ok(package?.map(|p| (store.id().to_string(), p)))
    }

    /// Every store whose package root prefixes `url`, in catalog order.
    /// Stores that cannot be opened or read are skipped.
    pub fn search_by_url(&self, url: &str) -> Result<Vec<StoreMatch>, FeedpackError> {
        if !self.catalog.is_supported() {
            return Ok(Vec::new());
        }
        let mut matches = Vec::new();
        for store_name in self.catalog.list_all()? {
            let (store_id, package) = match self.read_package(&store_name) {
                Ok(Some(found)) => found,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(store = %store_name, error = %e, "skipping unreadable store during scan");
                    continue;
                }
            };
            let Some(root) = package.root() else {
                continue;
            };
            if naming::url_matches(url, root) {
                matches.push(StoreMatch {
                    store_id,
                    store_name,
                    package,
                });
            }
        }
        Ok(matches)
    }

    /// The package active for `url`, if any.
    pub fn active_package_for_url(&self, url: &str) -> Result<Option<ActivePackage>, FeedpackError> {
        if !self.catalog.is_supported() {
            return Ok(None);
        }
        if let Some(entry) = self.cache.get(url) {
            tracing::debug!(url, store_id = %entry.store_id, "resolution cache hit");
            return Ok(Some(ActivePackage {
                store_id: entry.store_id,
                package: entry.package,
                cached: true,
            }));
        }

        let Some(first) = self.search_by_url(url)?.into_iter().next() else {
            tracing::debug!(url, "no active package");
            return Ok(None);
        };
        let root = first.package.root().unwrap_or_default().to_string();
        if let Err(e) = self
            .cache
            .set(CacheEntry::new(&root, first.package.clone(), &first.store_id))
        {
            tracing::warn!(error = %e, "failed to record resolution in cache");
        }
        Ok(Some(ActivePackage {
            store_id: first.store_id,
            package: first.package,
            cached: false,
        }))
    }
}

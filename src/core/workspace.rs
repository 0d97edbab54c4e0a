//! Consumer-facing surface over the catalog, cache and resolver.
//!
//! Every [`Store`] handed out by a [`Workspace`] carries the workspace cache,
//! so package writes made through it always invalidate the last resolution.

use crate::core::cache::{Cache, MemoryCache, SlotCache};
use crate::core::catalog::{Catalog, DiskCatalog, MemoryCatalog};
use crate::core::config::Config;
use crate::core::error::FeedpackError;
use crate::core::naming::StoreNaming;
use crate::core::resolver::{ActivePackage, Resolver, StoreMatch};
use crate::core::store::{Package, Store};
use std::sync::Arc;

pub struct Workspace {
    catalog: Arc<dyn Catalog>,
    cache: Arc<dyn Cache>,
    resolver: Resolver,
}

impl Workspace {
    pub fn new(catalog: Arc<dyn Catalog>, cache: Arc<dyn Cache>) -> Self {
        let resolver = Resolver::new(catalog.clone(), cache.clone());
        Self {
            catalog,
            cache,
            resolver,
        }
    }

    /// On-disk stores and the namespace's persistent slot cache under the
    /// configured data dir.
    pub fn from_config(config: &Config) -> Self {
        let data_dir = config.data_dir();
        let naming = config.naming();
        let cache = Arc::new(SlotCache::new(&data_dir, &naming));
        Self::new(Arc::new(DiskCatalog::new(&data_dir, naming)), cache)
    }

    pub fn in_memory(naming: StoreNaming) -> Self {
        Self::new(
            Arc::new(MemoryCatalog::new(naming)),
            Arc::new(MemoryCache::new()),
        )
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn is_supported(&self) -> bool {
        self.catalog.is_supported()
    }

    /// Unopened store handle wired to this workspace's cache.
    pub fn store(&self, title: Option<&str>, seed: Option<Package>) -> Store {
        Store::new(self.catalog.clone(), title, seed).with_cache(self.cache.clone())
    }

    /// Open (creating if needed) a store, seeding its package when empty.
    pub fn create_store(
        &self,
        title: Option<&str>,
        seed: Option<Package>,
    ) -> Result<Store, FeedpackError> {
        let mut store = self.store(title, seed);
        store.open()?;
        Ok(store)
    }

    /// Open an existing store by id.
    pub fn open_store(&self, store_id: &str) -> Result<Store, FeedpackError> {
        if !self.is_supported() {
            return Err(FeedpackError::Unsupported(
                "no persistence engine available".to_string(),
            ));
        }
        if !self.catalog.exists(store_id)? {
            return Err(FeedpackError::NotFound(format!("store '{}'", store_id)));
        }
        let name = self.catalog.naming().store_name(store_id);
        let mut store =
            Store::from_store_name(self.catalog.clone(), &name)?.with_cache(self.cache.clone());
        store.open()?;
        Ok(store)
    }

    pub fn update_package(
        &self,
        store_id: &str,
        package: &Package,
    ) -> Result<Package, FeedpackError> {
        let mut store = self.open_store(store_id)?;
        let result = store.update_package(package);
        store.close();
        result
    }

    /// Delete a store outright. The cache is cleared since it may point at it.
    pub fn delete_store(&self, store_id: &str) -> Result<bool, FeedpackError> {
        let deleted = self.catalog.delete(store_id)?;
        if deleted {
            self.cache.clear()?;
            tracing::info!(store_id, "store deleted");
        }
        Ok(deleted)
    }

    /// Every cataloged store that holds a package, in catalog order.
    pub fn list_packages(&self) -> Result<Vec<StoreMatch>, FeedpackError> {
        if !self.is_supported() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for store_name in self.catalog.list_all()? {
            let mut store = match Store::from_store_name(self.catalog.clone(), &store_name) {
                Ok(store) => store,
                Err(e) => {
                    tracing::warn!(store = %store_name, error = %e, "skipping store");
                    continue;
                }
            };
            let package = store.open_read_only().and_then(|_| store.get_package());
            store.close();
            match package {
                Ok(Some(package)) => out.push(StoreMatch {
                    store_id: store.id().to_string(),
                    store_name,
                    package,
                }),
                Ok(None) => {}
                Err(e) => tracing::warn!(store = %store_name, error = %e, "skipping store"),
            }
        }
        Ok(out)
    }

    pub fn search_by_url(&self, url: &str) -> Result<Vec<StoreMatch>, FeedpackError> {
        self.resolver.search_by_url(url)
    }

    pub fn active_package_for_url(
        &self,
        url: &str,
    ) -> Result<Option<ActivePackage>, FeedpackError> {
        self.resolver.active_package_for_url(url)
    }
}

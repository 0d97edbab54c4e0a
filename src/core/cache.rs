//! Single-slot memo of the last URL resolution.
//!
//! The slot has no versioning: any code that adds or changes a package must
//! call [`Cache::clear`]. Stores obtained through the workspace do this on
//! their own.

use crate::core::db;
use crate::core::error::FeedpackError;
use crate::core::naming::{self, StoreNaming};
use crate::core::schemas;
use crate::core::store::Package;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(rename = "rootURL")]
    pub root_url: String,
    pub store_id: String,
    pub package: Package,
}

impl CacheEntry {
    pub fn new(root_url: &str, package: Package, store_id: &str) -> Self {
        Self {
            root_url: root_url.to_string(),
            store_id: store_id.to_string(),
            package,
        }
    }

    pub fn covers(&self, url: &str) -> bool {
        naming::url_matches(url, &self.root_url)
    }
}

pub trait Cache: Send + Sync {
    /// A hit only when an entry exists and its root prefixes `url`.
    /// Unreadable entries count as a miss.
    fn get(&self, url: &str) -> Option<CacheEntry>;

    /// Overwrite the slot unconditionally.
    fn set(&self, entry: CacheEntry) -> Result<(), FeedpackError>;

    fn clear(&self) -> Result<(), FeedpackError>;
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self) -> Option<CacheEntry> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Cache for MemoryCache {
    fn get(&self, url: &str) -> Option<CacheEntry> {
        self.peek().filter(|entry| entry.covers(url))
    }

    fn set(&self, entry: CacheEntry) -> Result<(), FeedpackError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(entry);
        Ok(())
    }

    fn clear(&self) -> Result<(), FeedpackError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Package snapshot as persisted in the package slot: the package fields
/// plus the owning store id.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotPackage {
    #[serde(flatten)]
    package: Package,
    store_id: String,
}

/// Persistent cache kept as two flat string slots in a key-value table, so a
/// resolution survives process restarts. The file is scoped to one store
/// namespace.
#[derive(Debug, Clone)]
pub struct SlotCache {
    db_path: PathBuf,
}

impl SlotCache {
    pub fn new(data_dir: &Path, naming: &StoreNaming) -> Self {
        Self {
            db_path: data_dir.join(naming.cache_db_name()),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn with_conn<F, R>(&self, f: F) -> Result<R, FeedpackError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<R, FeedpackError>,
    {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = db::db_connect(&self.db_path.to_string_lossy())?;
        db::initialize_cache_schema(&conn)?;
        f(&conn)
    }

    /// Read the raw slot pair without the prefix check.
    pub fn load(&self) -> Result<Option<CacheEntry>, FeedpackError> {
        if !self.db_path.exists() {
            return Ok(None);
        }
        self.with_conn(|conn| {
            let read = |key: &str| -> Result<Option<String>, FeedpackError> {
                Ok(conn
                    .query_row(
                        "SELECT value FROM slots WHERE key = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()?)
            };
            let root_url = read(schemas::CACHE_ROOT_URL_KEY)?;
            let package = read(schemas::CACHE_PACKAGE_KEY)?;
            match (root_url, package) {
                (None, None) => Ok(None),
                (Some(root_url), Some(raw)) => {
                    let slot: SlotPackage = serde_json::from_str(&raw)?;
                    Ok(Some(CacheEntry {
                        root_url,
                        store_id: slot.store_id,
                        package: slot.package,
                    }))
                }
                _ => Err(FeedpackError::ValidationError(
                    "cache slots are half-written".to_string(),
                )),
            }
        })
    }
}

impl Cache for SlotCache {
    fn get(&self, url: &str) -> Option<CacheEntry> {
        match self.load() {
            Ok(entry) => entry.filter(|e| e.covers(url)),
            Err(e) => {
                tracing::warn!(path = %self.db_path.display(), error = %e, "ignoring unreadable resolution cache");
                None
            }
        }
    }

    fn set(&self, entry: CacheEntry) -> Result<(), FeedpackError> {
        let raw = serde_json::to_string(&SlotPackage {
            package: entry.package,
            store_id: entry.store_id,
        })?;
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let upsert = "INSERT INTO slots(key, value) VALUES(?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value";
            tx.execute(upsert, params![schemas::CACHE_ROOT_URL_KEY, entry.root_url])?;
            tx.execute(upsert, params![schemas::CACHE_PACKAGE_KEY, raw])?;
            tx.commit()?;
            Ok(())
        })
    }

    fn clear(&self) -> Result<(), FeedpackError> {
        if !self.db_path.exists() {
            return Ok(());
        }
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM slots WHERE key IN (?1, ?2)",
                params![schemas::CACHE_ROOT_URL_KEY, schemas::CACHE_PACKAGE_KEY],
            )?;
            Ok(())
        })
    }
}

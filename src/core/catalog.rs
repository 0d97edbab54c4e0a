//! Discovery of package stores.
//!
//! A catalog owns the physical side of the store naming convention: it knows
//! where stores live, which of them exist, and how to open a connection to one.
//! [`DiskCatalog`] keeps one SQLite file per store; [`MemoryCatalog`] keeps
//! shared-cache in-memory databases and stands in for it in tests.

use crate::core::db;
use crate::core::error::FeedpackError;
use crate::core::naming::StoreNaming;
use crate::core::schemas;
use crate::core::time;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait Catalog: Send + Sync {
    fn naming(&self) -> &StoreNaming;

    /// Whether a persistence engine is usable at all.
    fn is_supported(&self) -> bool;

    /// Every store name carrying this catalog's namespace, in enumeration order.
    fn list_all(&self) -> Result<Vec<String>, FeedpackError>;

    fn exists(&self, store_id: &str) -> Result<bool, FeedpackError>;

    /// Open a connection to the named store, creating the database if absent.
    fn connect(&self, store_name: &str) -> Result<Connection, FeedpackError>;

    /// Open an existing store for reading. Never creates or modifies it.
    fn connect_read_only(&self, store_name: &str) -> Result<Connection, FeedpackError>;

    /// Remove a store. Returns false when nothing was there.
    fn delete(&self, store_id: &str) -> Result<bool, FeedpackError>;
}

/// One `<namespace>-<id>.db` file per store inside `root`.
#[derive(Debug, Clone)]
pub struct DiskCatalog {
    root: PathBuf,
    naming: StoreNaming,
}

impl DiskCatalog {
    pub fn new(root: &Path, naming: StoreNaming) -> Self {
        Self {
            root: root.to_path_buf(),
            naming,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_path(&self, store_name: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", store_name, schemas::STORE_DB_EXTENSION))
    }

    fn check_owned(&self, store_name: &str) -> Result<(), FeedpackError> {
        if !self.naming.owns(store_name) {
            return Err(FeedpackError::ValidationError(format!(
                "store name '{}' is outside namespace '{}'",
                store_name, self.naming.namespace
            )));
        }
        Ok(())
    }
}

impl Catalog for DiskCatalog {
    fn naming(&self) -> &StoreNaming {
        &self.naming
    }

    // The nearest existing ancestor decides; the root itself is only created
    // by the first write.
    fn is_supported(&self) -> bool {
        let mut dir = self.root.as_path();
        loop {
            match fs::metadata(dir) {
                Ok(meta) => return meta.is_dir() && !meta.permissions().readonly(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => match dir.parent() {
                    Some(parent) if parent.as_os_str().is_empty() => dir = Path::new("."),
                    Some(parent) => dir = parent,
                    None => return false,
                },
                Err(_) => return false,
            }
        }
    }

    // Sorted so that resolution order does not depend on directory layout.
    fn list_all(&self) -> Result<Vec<String>, FeedpackError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(schemas::STORE_DB_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if self.naming.owns(stem) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn exists(&self, store_id: &str) -> Result<bool, FeedpackError> {
        Ok(self.store_path(&self.naming.store_name(store_id)).is_file())
    }

    fn connect(&self, store_name: &str) -> Result<Connection, FeedpackError> {
        if !self.is_supported() {
            return Err(FeedpackError::Unsupported(format!(
                "data directory {} is not writable",
                self.root.display()
            )));
        }
        self.check_owned(store_name)?;
        fs::create_dir_all(&self.root)?;
        db::db_connect(&self.store_path(store_name).to_string_lossy())
    }

    fn connect_read_only(&self, store_name: &str) -> Result<Connection, FeedpackError> {
        self.check_owned(store_name)?;
        let path = self.store_path(store_name);
        if !path.is_file() {
            return Err(FeedpackError::NotFound(format!("store file {}", path.display())));
        }
        db::db_connect_read_only(&path.to_string_lossy())
    }

    fn delete(&self, store_id: &str) -> Result<bool, FeedpackError> {
        let path = self.store_path(&self.naming.store_name(store_id));
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        for suffix in ["-wal", "-shm"] {
            let mut side = path.clone().into_os_string();
            side.push(suffix);
            let side = PathBuf::from(side);
            if side.exists() {
                fs::remove_file(side)?;
            }
        }
        Ok(true)
    }
}

/// In-memory catalog. Each store is a shared-cache SQLite database kept
/// alive by an anchor connection; enumeration follows creation order.
pub struct MemoryCatalog {
    token: String,
    naming: StoreNaming,
    anchors: Mutex<Vec<(String, Connection)>>,
}

impl MemoryCatalog {
    pub fn new(naming: StoreNaming) -> Self {
        Self {
            token: time::new_event_id().to_lowercase(),
            naming,
            anchors: Mutex::new(Vec::new()),
        }
    }

    fn uri(&self, store_name: &str) -> String {
        format!("file:{}-{}?mode=memory&cache=shared", self.token, store_name)
    }

    fn anchors(&self) -> std::sync::MutexGuard<'_, Vec<(String, Connection)>> {
        self.anchors.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_owned(&self, store_name: &str) -> Result<(), FeedpackError> {
        if !self.naming.owns(store_name) {
            return Err(FeedpackError::ValidationError(format!(
                "store name '{}' is outside namespace '{}'",
                store_name, self.naming.namespace
            )));
        }
        Ok(())
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new(StoreNaming::default())
    }
}

impl Catalog for MemoryCatalog {
    fn naming(&self) -> &StoreNaming {
        &self.naming
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn list_all(&self) -> Result<Vec<String>, FeedpackError> {
        Ok(self.anchors().iter().map(|(name, _)| name.clone()).collect())
    }

    fn exists(&self, store_id: &str) -> Result<bool, FeedpackError> {
        let name = self.naming.store_name(store_id);
        Ok(self.anchors().iter().any(|(n, _)| *n == name))
    }

    fn connect(&self, store_name: &str) -> Result<Connection, FeedpackError> {
        self.check_owned(store_name)?;
        let uri = self.uri(store_name);
        let mut anchors = self.anchors();
        if !anchors.iter().any(|(n, _)| n == store_name) {
            let anchor = db::db_connect_memory(&uri)?;
            anchors.push((store_name.to_string(), anchor));
        }
        db::db_connect_memory(&uri)
    }

    // Shared-cache memory databases are opened read-write; `query_only`
    // rejects every write on this connection instead.
    fn connect_read_only(&self, store_name: &str) -> Result<Connection, FeedpackError> {
        self.check_owned(store_name)?;
        if !self.anchors().iter().any(|(n, _)| n == store_name) {
            return Err(FeedpackError::NotFound(format!("store '{}'", store_name)));
        }
        let conn = db::db_connect_memory(&self.uri(store_name))?;
        conn.pragma_update(None, "query_only", true)?;
        Ok(conn)
    }

    fn delete(&self, store_id: &str) -> Result<bool, FeedpackError> {
        let name = self.naming.store_name(store_id);
        let mut anchors = self.anchors();
        let before = anchors.len();
        anchors.retain(|(n, _)| *n != name);
        Ok(anchors.len() != before)
    }
}

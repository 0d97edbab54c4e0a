//! Package stores.
//!
//! A [`Store`] is one isolated SQLite database holding at most one
//! [`Package`] and any number of [`Comment`]s keyed by timestamp. Stores are
//! opened around each logical operation and closed afterwards; nothing keeps
//! a connection alive between operations except an explicitly open handle.

use crate::core::cache::Cache;
use crate::core::catalog::Catalog;
use crate::core::db;
use crate::core::error::FeedpackError;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metadata identifying a feedback collection and the URL prefix it governs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub version: String,
    pub author: String,
    #[serde(rename = "rootURL", skip_serializing_if = "Option::is_none")]
    pub root_url: Option<String>,
}

impl Package {
    /// The root URL when set and non-empty.
    pub fn root(&self) -> Option<&str> {
        self.root_url.as_deref().filter(|r| !r.is_empty())
    }
}

/// One timestamped feedback entry tied to a page element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    pub timestamp: i64,
    pub xpath: String,
    pub element_text: String,
    pub page_url: String,
    pub document_title: String,
    pub feedback: String,
}

/// Outcome of adding a package. A store that already has a package is left
/// untouched and reports `AlreadyPresent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageWrite {
    Added(Package),
    AlreadyPresent,
}

pub struct Store {
    id: String,
    name: String,
    seed: Option<Package>,
    catalog: Arc<dyn Catalog>,
    cache: Option<Arc<dyn Cache>>,
    conn: Option<Connection>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("open", &self.conn.is_some())
            .finish()
    }
}

const COMMENT_COLUMNS: &str =
    "timestamp, xpath, element_text, page_url, document_title, feedback";

fn comment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        timestamp: row.get(0)?,
        xpath: row.get(1)?,
        element_text: row.get(2)?,
        page_url: row.get(3)?,
        document_title: row.get(4)?,
        feedback: row.get(5)?,
    })
}

impl Store {
    /// Build a handle for the store derived from `title` (sanitized), or for
    /// a freshly generated id when no title is given. Nothing is touched on
    /// disk until [`Store::open`].
    pub fn new(catalog: Arc<dyn Catalog>, title: Option<&str>, seed: Option<Package>) -> Self {
        let naming = catalog.naming();
        let id = match title {
            Some(t) => naming.sanitize_id(t),
            None => naming.generate_id(),
        };
        let name = naming.store_name(&id);
        Self {
            id,
            name,
            seed,
            catalog,
            cache: None,
            conn: None,
        }
    }

    /// Handle for an already cataloged store name.
    pub fn from_store_name(
        catalog: Arc<dyn Catalog>,
        store_name: &str,
    ) -> Result<Self, FeedpackError> {
        let id = catalog
            .naming()
            .store_id(store_name)
            .ok_or_else(|| {
                FeedpackError::ValidationError(format!(
                    "'{}' is not a store name in namespace '{}'",
                    store_name,
                    catalog.naming().namespace
                ))
            })?
            .to_string();
        Ok(Self {
            id,
            name: store_name.to_string(),
            seed: None,
            catalog,
            cache: None,
            conn: None,
        })
    }

    /// Attach the resolution cache cleared after every package change.
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Open (creating if absent) the database, ensure both collections exist
    /// and write the seed package into an empty store.
    pub fn open(&mut self) -> Result<(), FeedpackError> {
        if self.conn.is_some() {
            return Ok(());
        }
        if !self.catalog.is_supported() {
            return Err(FeedpackError::Unsupported(
                "no persistence engine available".to_string(),
            ));
        }
        let conn = self.logged("open", self.catalog.connect(&self.name))?;
        self.logged("open", db::initialize_store_schema(&conn))?;
        self.conn = Some(conn);
        tracing::debug!(store = %self.name, "store opened");

        if let Some(seed) = self.seed.clone() {
            if self.package_count()? == 0 {
                self.add_package(seed)?;
            }
        }
        Ok(())
    }

    /// Open an existing store for reading only: no schema setup, no seeding,
    /// and any write through this handle fails. Used by scans.
    pub fn open_read_only(&mut self) -> Result<(), FeedpackError> {
        if self.conn.is_some() {
            return Ok(());
        }
        if !self.catalog.is_supported() {
            return Err(FeedpackError::Unsupported(
                "no persistence engine available".to_string(),
            ));
        }
        let conn = self.logged("open", self.catalog.connect_read_only(&self.name))?;
        self.logged("open", db::check_store_schema(&conn))?;
        self.conn = Some(conn);
        tracing::debug!(store = %self.name, "store opened read-only");
        Ok(())
    }

    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            tracing::debug!(store = %self.name, "store closed");
        }
    }

    fn conn(&self) -> Result<&Connection, FeedpackError> {
        self.conn
            .as_ref()
            .ok_or_else(|| FeedpackError::StoreClosed(self.name.clone()))
    }

    fn logged<T>(&self, op: &str, result: Result<T, FeedpackError>) -> Result<T, FeedpackError> {
        if let Err(e) = &result {
            tracing::warn!(store = %self.name, op, error = %e, "store operation failed");
        }
        result
    }

    fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear() {
                tracing::warn!(store = %self.name, error = %e, "failed to clear resolution cache");
            }
        }
    }

    fn package_count(&self) -> Result<usize, FeedpackError> {
        let count: i64 = self.logged(
            "package.count",
            self.conn().and_then(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM package", [], |row| row.get(0))?)
            }),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Add the store's package. A store that already holds one is left as is.
    pub(crate) fn add_package(&self, mut package: Package) -> Result<PackageWrite, FeedpackError> {
        if self.package_count()? > 0 {
            tracing::debug!(store = %self.name, "package already present; add skipped");
            return Ok(PackageWrite::AlreadyPresent);
        }
        if package.id.is_empty() {
            package.id = self.catalog.naming().generate_id();
        }
        self.logged(
            "package.add",
            self.conn().and_then(|conn| {
                conn.execute(
                    "INSERT INTO package(id, name, version, author, root_url) VALUES(?1, ?2, ?3, ?4, ?5)",
                    params![
                        package.id,
                        package.name,
                        package.version,
                        package.author,
                        package.root_url
                    ],
                )?;
                Ok(())
            }),
        )?;
        self.invalidate_cache();
        Ok(PackageWrite::Added(package))
    }

    /// The store's package. More than one row is an integrity violation,
    /// never reported as absence.
    pub fn get_package(&self) -> Result<Option<Package>, FeedpackError> {
        let packages = self.logged(
            "package.get",
            self.conn().and_then(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name, version, author, root_url FROM package")?;
                let rows = stmt.query_map([], |row| {
                    Ok(Package {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        version: row.get(2)?,
                        author: row.get(3)?,
                        root_url: row.get(4)?,
                    })
                })?;
                let mut out = Vec::new();
                for r in rows {
                    out.push(r?);
                }
                Ok(out)
            }),
        )?;

        match packages.len() {
            0 => Ok(None),
            1 => Ok(packages.into_iter().next()),
            count => self.logged(
                "package.get",
                Err(FeedpackError::IntegrityViolation {
                    store: self.name.clone(),
                    count,
                }),
            ),
        }
    }

    /// Upsert the package by id. The id must already be set, and must match
    /// the package the store holds if there is one.
    pub fn update_package(&self, package: &Package) -> Result<Package, FeedpackError> {
        if package.id.is_empty() {
            return self.logged("package.update", Err(FeedpackError::MissingPackageId));
        }
        if let Some(existing) = self.get_package()? {
            if existing.id != package.id {
                return self.logged(
                    "package.update",
                    Err(FeedpackError::ValidationError(format!(
                        "store '{}' holds package '{}', not '{}'",
                        self.name, existing.id, package.id
                    ))),
                );
            }
        }
        self.logged(
            "package.update",
            self.conn().and_then(|conn| {
                conn.execute(
                    "INSERT INTO package(id, name, version, author, root_url) VALUES(?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        version = excluded.version,
                        author = excluded.author,
                        root_url = excluded.root_url",
                    params![
                        package.id,
                        package.name,
                        package.version,
                        package.author,
                        package.root_url
                    ],
                )?;
                Ok(())
            }),
        )?;
        self.invalidate_cache();
        Ok(package.clone())
    }

    /// Insert a comment. A duplicate timestamp fails this write only.
    pub fn add_comment(&self, comment: &Comment) -> Result<(), FeedpackError> {
        let result = self.conn().and_then(|conn| {
            conn.execute(
                &format!("INSERT INTO comments({COMMENT_COLUMNS}) VALUES(?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    comment.timestamp,
                    comment.xpath,
                    comment.element_text,
                    comment.page_url,
                    comment.document_title,
                    comment.feedback
                ],
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => {
                    FeedpackError::DuplicateComment(comment.timestamp)
                }
                _ => FeedpackError::RusqliteError(e),
            })?;
            Ok(())
        });
        self.logged("comment.add", result)
    }

    pub fn get_comment(&self, timestamp: i64) -> Result<Option<Comment>, FeedpackError> {
        self.logged(
            "comment.get",
            self.conn().and_then(|conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE timestamp = ?1"),
                        params![timestamp],
                        comment_from_row,
                    )
                    .optional()?)
            }),
        )
    }

    /// Overwrite the comment with the same timestamp. False when none exists.
    pub fn update_comment(&self, comment: &Comment) -> Result<bool, FeedpackError> {
        self.logged(
            "comment.update",
            self.conn().and_then(|conn| {
                let changed = conn.execute(
                    "UPDATE comments SET xpath = ?2, element_text = ?3, page_url = ?4,
                        document_title = ?5, feedback = ?6
                     WHERE timestamp = ?1",
                    params![
                        comment.timestamp,
                        comment.xpath,
                        comment.element_text,
                        comment.page_url,
                        comment.document_title,
                        comment.feedback
                    ],
                )?;
                Ok(changed > 0)
            }),
        )
    }

    /// False when no comment had that timestamp.
    pub fn delete_comment(&self, timestamp: i64) -> Result<bool, FeedpackError> {
        self.logged(
            "comment.delete",
            self.conn().and_then(|conn| {
                let changed =
                    conn.execute("DELETE FROM comments WHERE timestamp = ?1", params![timestamp])?;
                Ok(changed > 0)
            }),
        )
    }

    /// All comments in creation (timestamp) order.
    pub fn get_all_comments(&self) -> Result<Vec<Comment>, FeedpackError> {
        self.query_comments(
            "comment.list",
            &format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY timestamp ASC"),
            &[],
        )
    }

    pub fn comments_for_page(&self, page_url: &str) -> Result<Vec<Comment>, FeedpackError> {
        self.query_comments(
            "comment.list_page",
            &format!(
                "SELECT {COMMENT_COLUMNS} FROM comments WHERE page_url = ?1 ORDER BY timestamp ASC"
            ),
            &[&page_url as &dyn rusqlite::ToSql],
        )
    }

    pub fn comment_count(&self) -> Result<usize, FeedpackError> {
        let count: i64 = self.logged(
            "comment.count",
            self.conn().and_then(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?)
            }),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn query_comments(
        &self,
        op: &str,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Comment>, FeedpackError> {
        self.logged(
            op,
            self.conn().and_then(|conn| {
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt.query_map(args, comment_from_row)?;
                let mut out = Vec::new();
                for r in rows {
                    out.push(r?);
                }
                Ok(out)
            }),
        )
    }
}

//! Storage names and SQL schemas for package stores and the resolution cache.

/// Schema version stamped into every store via `PRAGMA user_version`.
pub const STORE_SCHEMA_VERSION: i64 = 1;

pub const STORE_DB_EXTENSION: &str = "db";

pub const PACKAGE_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS package (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        version TEXT NOT NULL DEFAULT '',
        author TEXT NOT NULL DEFAULT '',
        root_url TEXT
    )
";

pub const COMMENT_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS comments (
        timestamp INTEGER PRIMARY KEY,
        xpath TEXT NOT NULL DEFAULT '',
        element_text TEXT NOT NULL DEFAULT '',
        page_url TEXT NOT NULL DEFAULT '',
        document_title TEXT NOT NULL DEFAULT '',
        feedback TEXT NOT NULL DEFAULT ''
    )
";

pub const COMMENT_DB_INDEX_PAGE_URL: &str =
    "CREATE INDEX IF NOT EXISTS idx_comments_page_url ON comments(page_url)";

// Cache files are named `_<namespace>_resolution_cache.db`. The leading '_'
// keeps them apart from `<namespace>-<id>.db` store names.
pub const CACHE_DB_SUFFIX: &str = "resolution_cache.db";

pub const CACHE_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS slots (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
";

pub const CACHE_ROOT_URL_KEY: &str = "activeRootUrl";
pub const CACHE_PACKAGE_KEY: &str = "activePackage";

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DATA_DIR_NAME: &str = "data";

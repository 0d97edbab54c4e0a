//! Store naming convention and URL prefix matching.
//!
//! A store's physical name is `<namespace>-<id>`. The catalog discovers stores
//! by that prefix, so the convention is part of the on-disk contract.

use crate::core::schemas;
use crate::core::time;
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_NAMESPACE: &str = "feedpack";
pub const DEFAULT_MAX_ID_LEN: usize = 48;
pub const SEPARATOR: char = '-';

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static PROTOCOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNaming {
    pub namespace: String,
    pub max_id_len: usize,
}

impl Default for StoreNaming {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            max_id_len: DEFAULT_MAX_ID_LEN,
        }
    }
}

impl StoreNaming {
    pub fn new(namespace: &str, max_id_len: usize) -> Self {
        Self {
            namespace: namespace.to_string(),
            max_id_len,
        }
    }

    /// Lower-case, collapse runs of non-alphanumerics into one separator and
    /// truncate. Titles that sanitize to nothing get a generated id.
    pub fn sanitize_id(&self, title: &str) -> String {
        let lowered = title.to_lowercase();
        let replaced = NON_ALNUM.replace_all(&lowered, "-");
        let trimmed = replaced.trim_matches(SEPARATOR);
        let truncated: String = trimmed.chars().take(self.max_id_len).collect();
        let id = truncated.trim_end_matches(SEPARATOR).to_string();
        if id.is_empty() {
            self.generate_id()
        } else {
            id
        }
    }

    pub fn generate_id(&self) -> String {
        time::new_event_id()
            .to_lowercase()
            .chars()
            .take(self.max_id_len)
            .collect()
    }

    pub fn store_name(&self, store_id: &str) -> String {
        format!("{}{}{}", self.namespace, SEPARATOR, store_id)
    }

    /// Inverse of [`StoreNaming::store_name`]; `None` for names outside the namespace.
    pub fn store_id<'a>(&self, store_name: &'a str) -> Option<&'a str> {
        store_name
            .strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .filter(|id| !id.is_empty())
    }

    pub fn owns(&self, store_name: &str) -> bool {
        self.store_id(store_name).is_some()
    }

    /// Resolution cache file for this namespace. Namespaces sharing a data
    /// dir never see each other's cached resolution.
    pub fn cache_db_name(&self) -> String {
        format!("_{}_{}", self.namespace, schemas::CACHE_DB_SUFFIX)
    }
}

/// Strip a leading `http://` or `https://`.
pub fn normalize_url(url: &str) -> &str {
    match PROTOCOL.find(url) {
        Some(m) => &url[m.end()..],
        None => url,
    }
}

/// True when `url` starts with `root`, either verbatim or after both sides
/// drop their protocol. A root that is empty or only a protocol
/// (`https://`) never matches.
pub fn url_matches(url: &str, root: &str) -> bool {
    if root.is_empty() || normalize_url(root).is_empty() {
        return false;
    }
    url.starts_with(root) || normalize_url(url).starts_with(normalize_url(root))
}

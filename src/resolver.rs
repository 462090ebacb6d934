//! Path to object resolution backed by a path cache.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::models::{ListQuery, RemoteObject, OBJECT_FIELDS};
use crate::path::{escape_query_value, DrivePath};
use crate::query::QueryExecutor;

/// Cached verdict for a path: `None` records that nothing exists there.
pub type CacheEntry = Option<RemoteObject>;

/// Resolves paths segment by segment, remembering every verdict.
///
/// The cache only grows. A miss cached for a prefix stops every later walk
/// through that prefix before it reaches the network.
pub struct PathResolver {
    executor: QueryExecutor,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl PathResolver {
    pub fn new(executor: QueryExecutor, root: RemoteObject) -> Self {
        let mut cache = HashMap::new();
        cache.insert("/".to_string(), Some(root));
        Self {
            executor,
            cache: RwLock::new(cache),
        }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// The cached verdict for `path`, if there is one. Never touches the network.
    pub async fn cached(&self, path: &str) -> Option<CacheEntry> {
        let key = DrivePath::parse(path).key();
        self.cache.read().await.get(&key).cloned()
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Resolve `path` to its remote object, or `None` when it does not exist.
    #[instrument(skip(self))]
    pub async fn resolve(&self, path: &str) -> Result<Option<RemoteObject>> {
        let path = DrivePath::parse(path);
        let key = path.key();

        if let Some(entry) = self.cache.read().await.get(&key) {
            debug!(%key, hit = entry.is_some(), "path cache");
            return Ok(entry.clone());
        }

        let mut parent = self.lookup(&path.prefix_key(0)).await;
        for depth in 1..=path.depth() {
            let parent_id = match parent {
                Some(Some(ref object)) => object.id.clone(),
                _ => break,
            };

            let sub_key = path.prefix_key(depth);
            parent = match self.lookup(&sub_key).await {
                Some(entry) => Some(entry),
                None => {
                    let found = self.find_child(&parent_id, &path.name(depth - 1)).await?;
                    debug!(key = %sub_key, found = found.is_some(), "segment resolved");
                    self.cache.write().await.insert(sub_key, found.clone());
                    Some(found)
                }
            };
        }

        // The walk stopped early only because a prefix is missing.
        Ok(self.lookup(&key).await.flatten())
    }

    async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        self.cache.read().await.get(key).cloned()
    }

    /// Find the non-trashed child of `parent_id` named exactly `name`.
    async fn find_child(&self, parent_id: &str, name: &str) -> Result<Option<RemoteObject>> {
        let query = ListQuery {
            q: format!(
                "'{}' in parents and name = '{}' and trashed = false",
                escape_query_value(parent_id),
                escape_query_value(name)
            ),
            fields: format!("files({})", OBJECT_FIELDS),
            page_token: None,
            page_size: 1,
            order_by: None,
        };
        let response = self.executor.execute(&query).await?;
        Ok(response.files.into_iter().next())
    }
}

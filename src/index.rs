//! Path-addressed access to a drive folder tree.

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::{Client, Response};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::{info, instrument};

use crate::auth::{Credentials, TokenManager};
use crate::config::DriveConfig;
use crate::error::{DriveError, Result};
use crate::listing::{self, MAX_PAGE_SIZE};
use crate::models::{ApiErrorResponse, Node, RemoteObject};
use crate::query::{QueryExecutor, RetryPolicy, DRIVE_API_BASE};
use crate::resolver::{CacheEntry, PathResolver};

/// One client session: token state and path cache live here for its lifetime.
pub struct DriveIndex {
    resolver: PathResolver,
    page_size: u32,
}

impl DriveIndex {
    /// Create a session against the public Google endpoints.
    pub fn new(credentials: Credentials, root_id: impl Into<String>) -> Self {
        let http = Client::new();
        let auth = TokenManager::new(credentials, http.clone());
        let executor = QueryExecutor::new(http, auth, DRIVE_API_BASE, RetryPolicy::default());
        Self::from_parts(executor, root_id, MAX_PAGE_SIZE)
    }

    /// Create a session from a loaded configuration.
    pub fn from_config(config: &DriveConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::new();
        let auth = TokenManager::with_token_uri(
            config.credentials(),
            http.clone(),
            config.token_uri.clone(),
        );
        let executor = QueryExecutor::new(
            http,
            auth,
            config.api_base.clone(),
            config.rate_limit.policy(),
        );
        Ok(Self::from_parts(executor, config.root_id()?, config.page_size))
    }

    /// Assemble a session from an executor, e.g. one aimed at a test server.
    pub fn from_parts(
        executor: QueryExecutor,
        root_id: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            resolver: PathResolver::new(executor, RemoteObject::root(root_id)),
            page_size,
        }
    }

    /// Make sure a valid access token is held. Safe to call repeatedly.
    pub async fn authorize(&self) -> Result<()> {
        self.executor().auth().ensure_valid().await?;
        Ok(())
    }

    /// Resolve `path` and attach the capability matching its kind.
    pub async fn index(&self, path: &str) -> Result<Entry<'_>> {
        let object = self
            .resolver
            .resolve(path)
            .await?
            .ok_or_else(|| DriveError::NotFound(path.to_string()))?;

        let node = Node::from(object);
        Ok(if node.is_folder {
            Entry::Folder(FolderView { index: self, node })
        } else {
            Entry::File(FileView { index: self, node })
        })
    }

    /// Cached verdict for `path` without any network access.
    pub async fn cached(&self, path: &str) -> Option<CacheEntry> {
        self.resolver.cached(path).await
    }

    pub async fn cache_len(&self) -> usize {
        self.resolver.cache_len().await
    }

    fn executor(&self) -> &QueryExecutor {
        self.resolver.executor()
    }
}

/// A resolved path, either a folder or a file.
pub enum Entry<'a> {
    Folder(FolderView<'a>),
    File(FileView<'a>),
}

impl Entry<'_> {
    pub fn node(&self) -> &Node {
        match self {
            Entry::Folder(view) => &view.node,
            Entry::File(view) => &view.node,
        }
    }

    pub fn object(&self) -> &RemoteObject {
        &self.node().object
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Entry::Folder(_))
    }
}

/// A resolved folder; can list its children.
pub struct FolderView<'a> {
    index: &'a DriveIndex,
    pub node: Node,
}

impl FolderView<'_> {
    /// Every direct child, in server order.
    pub async fn list(&self) -> Result<Vec<Node>> {
        let executor = self.index.executor();
        let children =
            listing::list_children(executor, &self.node.object.id, self.index.page_size).await?;
        Ok(children.into_iter().map(Node::from).collect())
    }
}

/// A resolved file; can stream its bytes.
pub struct FileView<'a> {
    index: &'a DriveIndex,
    pub node: Node,
}

impl FileView<'_> {
    /// Fetch the file content, optionally restricted to an HTTP byte range
    /// such as `bytes=0-1023`.
    #[instrument(skip(self), fields(id = %self.node.object.id))]
    pub async fn raw(&self, range: Option<&str>) -> Result<RawContent> {
        let executor = self.index.executor();
        let token = executor.auth().ensure_valid().await?;

        let mut request = executor
            .http()
            .get(format!("{}/files/{}", executor.api_base(), self.node.object.id))
            .bearer_auth(&token)
            .query(&[("alt", "media")]);
        if let Some(range) = range {
            request = request.header(RANGE, range);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .map(|e| e.error.message)
                .unwrap_or(error_body);
            return Err(DriveError::RangeRead {
                status: status.as_u16(),
                message,
            });
        }

        info!(status = status.as_u16(), "streaming file content");
        Ok(RawContent { response })
    }
}

/// A successful media response whose body has not been read yet.
pub struct RawContent {
    response: Response,
}

impl RawContent {
    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header(CONTENT_LENGTH.as_str())
            .and_then(|v| v.parse().ok())
    }

    pub fn content_range(&self) -> Option<&str> {
        self.header(CONTENT_RANGE.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> {
        self.response.bytes_stream().map(|chunk| chunk.map_err(DriveError::from))
    }

    pub fn into_async_read(self) -> impl AsyncRead {
        StreamReader::new(self.response.bytes_stream().map_err(std::io::Error::other))
    }

    pub async fn bytes(self) -> Result<Bytes> {
        Ok(self.response.bytes().await?)
    }
}

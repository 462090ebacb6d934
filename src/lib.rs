//! drive_index - Path-addressed, read-only access to a Google Drive folder tree.
//!
//! This library provides functionality to:
//! - Keep an OAuth2 access token fresh from a long-lived refresh token
//! - Resolve human-readable paths like `a/b/c.txt` to Drive objects, caching
//!   every verdict (including misses) for the lifetime of the session
//! - List folders across all result pages, retrying through rate limits
//! - Stream file content, optionally by byte range
//!
//! # Example
//!
//! ```no_run
//! use drive_index::{DriveConfig, DriveIndex, Entry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DriveConfig::from_file("drive_index.json")?;
//!     let index = DriveIndex::from_config(&config)?;
//!
//!     if let Entry::Folder(folder) = index.index("music/live").await? {
//!         for child in folder.list().await? {
//!             println!("{}", child.object);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod index;
pub mod listing;
pub mod models;
pub mod path;
pub mod query;
pub mod resolver;

// Re-exports for convenience
pub use auth::{Credentials, TokenManager};
pub use config::DriveConfig;
pub use error::{DriveError, Result};
pub use index::{DriveIndex, Entry, FileView, FolderView, RawContent};
pub use models::{Node, RemoteObject};
pub use query::{QueryExecutor, RetryPolicy};

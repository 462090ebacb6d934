//! Draining paginated folder listings.

use tracing::{debug, instrument};

use crate::error::Result;
use crate::models::{ListQuery, RemoteObject, OBJECT_FIELDS};
use crate::path::escape_query_value;
use crate::query::QueryExecutor;

/// File name reserved for a folder's password marker; never listed.
pub const RESERVED_NAME: &str = ".password";

/// Folders first, then by name.
pub const LIST_ORDER: &str = "folder,name,modifiedTime desc";

/// Largest page size the files.list endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Filter selecting the visible, non-trashed children of `parent_id`.
pub fn children_filter(parent_id: &str) -> String {
    format!(
        "'{}' in parents and trashed = false and name != '{}'",
        escape_query_value(parent_id),
        RESERVED_NAME
    )
}

/// List every direct child of a folder, following continuation tokens.
///
/// The server's ordering is preserved within and across pages.
#[instrument(skip(executor))]
pub async fn list_children(
    executor: &QueryExecutor,
    parent_id: &str,
    page_size: u32,
) -> Result<Vec<RemoteObject>> {
    let mut query = ListQuery {
        q: children_filter(parent_id),
        fields: format!("nextPageToken, files({})", OBJECT_FIELDS),
        page_token: None,
        page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        order_by: Some(LIST_ORDER.to_string()),
    };
    let mut all_files = Vec::new();
    let mut pages = 0usize;

    loop {
        let page = executor.execute(&query).await?;
        pages += 1;
        all_files.extend(page.files);

        match page.next_page_token {
            Some(token) => query.page_token = Some(token),
            None => break,
        }
    }

    debug!(pages, count = all_files.len(), "listing complete");
    Ok(all_files)
}

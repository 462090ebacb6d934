//! Data models for Google Drive API requests and responses.

use serde::{Deserialize, Serialize};

/// MIME type the Drive API uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Attributes requested for every remote object.
pub const OBJECT_FIELDS: &str = "id, name, mimeType, size, modifiedTime, description, \
     iconLink, thumbnailLink, imageMediaMetadata, videoMediaMetadata";

/// Metadata for a file or folder in Google Drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(
        default,
        deserialize_with = "deserialize_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_media_metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_media_metadata: Option<serde_json::Value>,
}

impl RemoteObject {
    /// The sentinel folder seeded for the root path.
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            size: None,
            modified_time: None,
            description: None,
            icon_link: None,
            thumbnail_link: None,
            image_media_metadata: None,
            video_media_metadata: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

// The API sends sizes as decimal strings; accept plain numbers too so our own
// serialized output reads back.
fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    match Option::<Size>::deserialize(deserializer)? {
        Some(Size::Text(s)) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
        Some(Size::Number(n)) => Ok(Some(n)),
        None => Ok(None),
    }
}

impl std::fmt::Display for RemoteObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_str = self
            .size
            .map(format_size)
            .unwrap_or_else(|| "-".to_string());
        let mime = if self.mime_type.is_empty() {
            "-"
        } else {
            &self.mime_type
        };
        write!(f, "{}\t{}\t{}\t{}", self.id, size_str, mime, self.name)
    }
}

/// A remote object annotated with its folder classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    pub object: RemoteObject,
    #[serde(rename = "isFolder")]
    pub is_folder: bool,
}

impl From<RemoteObject> for Node {
    fn from(object: RemoteObject) -> Self {
        let is_folder = object.is_folder();
        Self { object, is_folder }
    }
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Parameters for one call to the files.list endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub q: String,
    pub fields: String,
    pub page_token: Option<String>,
    pub page_size: u32,
    pub order_by: Option<String>,
}

impl ListQuery {
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.q.clone()),
            ("fields", self.fields.clone()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(ref order_by) = self.order_by {
            params.push(("orderBy", order_by.clone()));
        }
        if let Some(ref token) = self.page_token {
            params.push(("pageToken", token.clone()));
        }
        params
    }
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<RemoteObject>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// OAuth2 error payload from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

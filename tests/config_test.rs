//! Tests for loading a session from a configuration file.

use std::io::Write;

use drive_index::error::DriveError;
use drive_index::{DriveConfig, DriveIndex};
use mockito::{Matcher, Server};
use serde_json::json;
use tempfile::NamedTempFile;

fn write_config(value: serde_json::Value) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(value.to_string().as_bytes()).unwrap();
    temp_file
}

#[test]
fn test_config_from_file() {
    let file = write_config(json!({
        "client_id": "client",
        "client_secret": "secret",
        "refresh_token": "1//refresh",
        "root": "https://drive.google.com/drive/folders/0AAroot",
        "page_size": 250
    }));

    let config = DriveConfig::from_file(file.path()).unwrap();
    assert_eq!(config.page_size, 250);
    assert_eq!(config.root_id().unwrap(), "0AAroot");
}

#[test]
fn test_config_from_missing_file() {
    let err = DriveConfig::from_file("/nonexistent/path/drive_index.json").unwrap_err();
    assert!(matches!(err, DriveError::Io(_)));
}

#[test]
fn test_config_from_invalid_json() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"not valid json").unwrap();

    let err = DriveConfig::from_file(temp_file.path()).unwrap_err();
    assert!(matches!(err, DriveError::Json(_)));
}

#[test]
fn test_session_rejects_bad_page_size() {
    let file = write_config(json!({
        "client_id": "client",
        "client_secret": "secret",
        "refresh_token": "1//refresh",
        "page_size": 0
    }));

    let config = DriveConfig::from_file(file.path()).unwrap();
    assert!(matches!(
        DriveIndex::from_config(&config),
        Err(DriveError::Config(_))
    ));
}

#[tokio::test]
async fn test_session_uses_configured_endpoints_and_root() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "access_token": "ya29.cfg", "expires_in": 3599 }).to_string())
        .expect(1)
        .create_async()
        .await;
    let lookup = server
        .mock("GET", "/drive/v3/files")
        .match_query(Matcher::UrlEncoded(
            "q".into(),
            "'0AAroot' in parents and name = 'notes.md' and trashed = false".into(),
        ))
        .match_header("authorization", "Bearer ya29.cfg")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "files": [{ "id": "N1", "name": "notes.md", "mimeType": "text/markdown" }] })
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let file = write_config(json!({
        "client_id": "client",
        "client_secret": "secret",
        "refresh_token": "1//refresh",
        "root": "0AAroot",
        "api_base": format!("{}/drive/v3/", server.url()),
        "token_uri": format!("{}/oauth/token", server.url())
    }));
    let config = DriveConfig::from_file(file.path()).unwrap();
    let index = DriveIndex::from_config(&config).unwrap();

    index.authorize().await.unwrap();
    let entry = index.index("notes.md").await.unwrap();
    assert_eq!(entry.object().id, "N1");
    assert!(!entry.node().is_folder);

    token.assert_async().await;
    lookup.assert_async().await;
}

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{error::Result, types::ByteStream};

/// A raw entry as Dropbox reports it
///
/// Every field is optional: deleted entries carry only a name and paths,
/// folders carry no size or modification time, and upload results omit the tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEntry {
    #[serde(rename = ".tag", default)]
    pub tag: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub server_modified: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl ApiEntry {
    pub fn is_folder(&self) -> bool {
        self.tag == "folder"
    }
}

/// One page of a folder listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListFolderResult {
    #[serde(default)]
    pub entries: Vec<ApiEntry>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// A download in progress: metadata is known up front, bytes follow
pub struct DownloadResult {
    pub metadata: ApiEntry,
    pub stream: ByteStream,
}

/// What to do when an upload targets an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Add,
    Overwrite,
}

/// Calls against the Dropbox files API
///
/// Paths are absolute Dropbox paths (`/a/b`, or `""` for the root).
/// Implementors report remote rejections as `AdapterError::BadRequest`.
#[async_trait]
pub trait DropboxApi: Send + Sync {
    async fn upload(&self, path: &str, contents: Bytes, mode: WriteMode) -> Result<ApiEntry>;

    async fn upload_stream(
        &self,
        path: &str,
        contents: ByteStream,
        mode: WriteMode,
    ) -> Result<ApiEntry>;

    async fn download(&self, path: &str) -> Result<DownloadResult>;

    async fn delete(&self, path: &str) -> Result<ApiEntry>;

    async fn move_path(&self, from: &str, to: &str) -> Result<ApiEntry>;

    async fn copy(&self, from: &str, to: &str) -> Result<ApiEntry>;

    async fn create_folder(&self, path: &str) -> Result<ApiEntry>;

    async fn get_metadata(&self, path: &str) -> Result<ApiEntry>;

    async fn list_folder(&self, path: &str, recursive: bool) -> Result<ListFolderResult>;

    async fn list_folder_continue(&self, cursor: &str) -> Result<ListFolderResult>;

    /// A short-lived direct download link for a file
    async fn get_temporary_link(&self, path: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_entry_ignores_unknown_fields() {
        let entry: ApiEntry = serde_json::from_value(serde_json::json!({
            ".tag": "file",
            "name": "Prime_Numbers.txt",
            "path_lower": "/homework/math/prime_numbers.txt",
            "path_display": "/Homework/math/Prime_Numbers.txt",
            "id": "id:a4ayc_80_OEAAAAAAAAAXw",
            "client_modified": "2015-05-12T15:50:38Z",
            "server_modified": "2015-05-12T15:50:38Z",
            "rev": "a1c10ce0dd78",
            "size": 7212,
            "is_downloadable": true,
        }))
        .unwrap();

        assert!(!entry.is_folder());
        assert_eq!(entry.size, Some(7212));
        assert_eq!(entry.name.as_deref(), Some("Prime_Numbers.txt"));
        assert_eq!(entry.content_hash, None);
    }

    #[test]
    fn test_list_folder_result_defaults() {
        let page: ListFolderResult = serde_json::from_value(serde_json::json!({
            "entries": [{".tag": "folder", "name": "dirname", "path_lower": "dirname"}],
        }))
        .unwrap();

        assert_eq!(page.entries.len(), 1);
        assert!(page.entries[0].is_folder());
        assert!(!page.has_more);
        assert_eq!(page.cursor, None);
    }

    #[test]
    fn test_write_mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(WriteMode::Overwrite).unwrap(),
            serde_json::json!("overwrite")
        );
    }
}

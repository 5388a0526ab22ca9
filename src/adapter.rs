use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;
use tracing::{debug, warn};

use crate::{
    client::{ApiEntry, DropboxApi, WriteMode},
    config::{Config, DropboxConfig},
    dropbox::DropboxClient,
    error::{AdapterError, Result},
    filesystem::FilesystemAdapter,
    path::{apply_prefix, display_path, normalize_prefix, remove_prefix},
    types::{ByteStream, EntryType, FileContents, FileStream, Metadata},
};

/// Filesystem adapter backed by a Dropbox account
///
/// Every logical path is resolved below `prefix`, and the prefix is
/// stripped again from every path that comes back. The adapter keeps no
/// state between calls.
#[derive(Clone)]
pub struct DropboxAdapter<C = DropboxClient> {
    client: C,
    prefix: String,
}

enum Upload {
    Buffer(Bytes),
    Stream(ByteStream),
}

impl DropboxAdapter<DropboxClient> {
    /// Build an adapter with its own HTTP client
    pub fn connect(config: DropboxConfig, prefix: &str) -> Result<Self> {
        Ok(Self::with_prefix(DropboxClient::new(config)?, prefix))
    }
}

impl<C: DropboxApi> DropboxAdapter<C> {
    /// Create an adapter rooted at the top of the account
    pub fn new(client: C) -> Self {
        Self::with_prefix(client, "")
    }

    /// Create an adapter rooted at `prefix`
    pub fn with_prefix(client: C, prefix: &str) -> Self {
        Self {
            client,
            prefix: normalize_prefix(prefix),
        }
    }

    /// The underlying API client, for calls the adapter does not cover
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The absolute Dropbox path for a logical path
    pub fn apply_path_prefix(&self, path: &str) -> String {
        apply_prefix(&self.prefix, path)
    }

    /// Convert a raw entry into a metadata record relative to this adapter
    pub fn normalize(&self, entry: &ApiEntry) -> Metadata {
        normalize_entry(entry, &self.prefix)
    }

    /// A short-lived direct download link for a file
    pub async fn get_temporary_link(&self, path: &str) -> Result<String> {
        let location = self.apply_path_prefix(path);
        debug!(path = %location, "get_temporary_link");
        self.client.get_temporary_link(&location).await
    }

    async fn upload(&self, path: &str, contents: Upload, config: &Config) -> Result<Metadata> {
        let location = self.apply_path_prefix(path);
        debug!(path = %location, "upload");

        let entry = match contents {
            Upload::Buffer(bytes) => {
                self.client
                    .upload(&location, bytes, WriteMode::Overwrite)
                    .await?
            }
            Upload::Stream(stream) => {
                self.client
                    .upload_stream(&location, stream, WriteMode::Overwrite)
                    .await?
            }
        };

        let mut metadata = self.normalize(&entry);
        metadata.mimetype = config.get_str("mimetype").map(String::from);
        Ok(metadata)
    }
}

/// Build a metadata record from a raw entry
///
/// `path` is the lowercase path without the prefix. `path_display` keeps the
/// remote's casing; when the remote sends none it is rebuilt from the
/// lowercase parent and the case-correct `name`.
pub fn normalize_entry(entry: &ApiEntry, prefix: &str) -> Metadata {
    let lower = entry
        .path_lower
        .clone()
        .or_else(|| entry.path_display.as_ref().map(|p| p.to_lowercase()))
        .unwrap_or_default();

    let name = entry.name.clone().unwrap_or_else(|| {
        let display = entry.path_display.as_deref().unwrap_or(&lower);
        display.rsplit('/').next().unwrap_or_default().to_string()
    });

    let path_display = match &entry.path_display {
        Some(display) => remove_prefix(prefix, display),
        None => display_path(&lower, &name, prefix),
    };

    let entry_type = if entry.is_folder() {
        EntryType::Dir
    } else {
        EntryType::File
    };

    let (timestamp, size) = if entry_type.is_file() {
        (
            entry.server_modified.as_deref().and_then(parse_timestamp),
            entry.size,
        )
    } else {
        (None, None)
    };

    Metadata {
        entry_type,
        path: remove_prefix(prefix, &lower),
        path_display,
        name,
        timestamp,
        size,
        mimetype: None,
    }
}

/// Unix seconds from an RFC 3339 timestamp such as `2015-05-12T15:50:38Z`
fn parse_timestamp(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .ok()
}

/// Collapse a failure into `None`, logging what was swallowed
fn best_effort<T>(operation: &'static str, path: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(operation, path, %error, "dropbox call failed");
            None
        }
    }
}

#[async_trait]
impl<C: DropboxApi> FilesystemAdapter for DropboxAdapter<C> {
    async fn write(&self, path: &str, contents: Bytes, config: &Config) -> Result<Metadata> {
        self.upload(path, Upload::Buffer(contents), config).await
    }

    async fn write_stream(
        &self,
        path: &str,
        contents: ByteStream,
        config: &Config,
    ) -> Result<Metadata> {
        self.upload(path, Upload::Stream(contents), config).await
    }

    async fn update(&self, path: &str, contents: Bytes, config: &Config) -> Result<Metadata> {
        self.upload(path, Upload::Buffer(contents), config).await
    }

    async fn update_stream(
        &self,
        path: &str,
        contents: ByteStream,
        config: &Config,
    ) -> Result<Metadata> {
        self.upload(path, Upload::Stream(contents), config).await
    }

    async fn read(&self, path: &str) -> Result<FileContents> {
        self.read_stream(path).await?.into_contents().await
    }

    async fn read_stream(&self, path: &str) -> Result<FileStream> {
        let location = self.apply_path_prefix(path);
        debug!(path = %location, "download");

        let download = self.client.download(&location).await?;

        Ok(FileStream {
            metadata: self.normalize(&download.metadata),
            stream: download.stream,
        })
    }

    async fn delete(&self, path: &str) -> bool {
        let location = self.apply_path_prefix(path);
        debug!(path = %location, "delete");

        best_effort("delete", &location, self.client.delete(&location).await).is_some()
    }

    async fn delete_dir(&self, path: &str) -> bool {
        self.delete(path).await
    }

    async fn create_dir(&self, path: &str, _config: &Config) -> Option<Metadata> {
        let location = self.apply_path_prefix(path);
        debug!(path = %location, "create_folder");

        let entry = best_effort(
            "create_folder",
            &location,
            self.client.create_folder(&location).await,
        )?;

        Some(self.normalize(&entry))
    }

    async fn rename(&self, from: &str, to: &str) -> bool {
        let from = self.apply_path_prefix(from);
        let to = self.apply_path_prefix(to);
        debug!(from = %from, to = %to, "move");

        best_effort("move", &from, self.client.move_path(&from, &to).await).is_some()
    }

    async fn copy(&self, from: &str, to: &str) -> bool {
        let from = self.apply_path_prefix(from);
        let to = self.apply_path_prefix(to);
        debug!(from = %from, to = %to, "copy");

        best_effort("copy", &from, self.client.copy(&from, &to).await).is_some()
    }

    async fn has(&self, path: &str) -> bool {
        self.get_metadata(path).await.is_some()
    }

    async fn get_metadata(&self, path: &str) -> Option<Metadata> {
        let location = self.apply_path_prefix(path);
        debug!(path = %location, "get_metadata");

        let entry = best_effort(
            "get_metadata",
            &location,
            self.client.get_metadata(&location).await,
        )?;

        Some(self.normalize(&entry))
    }

    async fn get_size(&self, path: &str) -> Option<u64> {
        self.get_metadata(path).await?.size
    }

    async fn get_timestamp(&self, path: &str) -> Option<i64> {
        self.get_metadata(path).await?.timestamp
    }

    async fn get_mimetype(&self, _path: &str) -> Result<Option<String>> {
        // Dropbox stores no content type
        Err(AdapterError::Unsupported {
            operation: "get_mimetype",
        })
    }

    async fn list_contents(&self, directory: &str, recursive: bool) -> Result<Vec<Metadata>> {
        let location = self.apply_path_prefix(directory);
        debug!(path = %location, recursive, "list_folder");

        let mut page = self.client.list_folder(&location, recursive).await?;
        let mut contents = Vec::new();

        loop {
            debug!(entries = page.entries.len(), has_more = page.has_more, "list page");
            contents.extend(page.entries.iter().map(|entry| self.normalize(entry)));

            if !page.has_more {
                break;
            }

            let cursor = page.cursor.take().ok_or_else(|| AdapterError::InvalidResponse {
                message: format!("listing of {} has more pages but no cursor", location),
            })?;
            page = self.client.list_folder_continue(&cursor).await?;
        }

        Ok(contents)
    }
}

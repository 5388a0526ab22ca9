use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    config::Config,
    error::Result,
    types::{ByteStream, FileContents, FileStream, Metadata},
};

/// Generic filesystem operations over a storage backend
///
/// Paths are relative to the backend's root and never start with a slash.
///
/// Failures are reported two ways. Operations that carry content (the write
/// and read families, listing) return `Result` so callers can see why they
/// failed. Mutations and lookups are best-effort and collapse any failure
/// into `false` or `None`.
#[async_trait]
pub trait FilesystemAdapter: Send + Sync {
    /// Write a new file
    async fn write(&self, path: &str, contents: Bytes, config: &Config) -> Result<Metadata>;

    /// Write a new file from a stream
    async fn write_stream(
        &self,
        path: &str,
        contents: ByteStream,
        config: &Config,
    ) -> Result<Metadata>;

    /// Replace an existing file
    async fn update(&self, path: &str, contents: Bytes, config: &Config) -> Result<Metadata>;

    /// Replace an existing file from a stream
    async fn update_stream(
        &self,
        path: &str,
        contents: ByteStream,
        config: &Config,
    ) -> Result<Metadata>;

    /// Read a whole file into memory
    async fn read(&self, path: &str) -> Result<FileContents>;

    /// Open a file for streaming
    async fn read_stream(&self, path: &str) -> Result<FileStream>;

    async fn delete(&self, path: &str) -> bool;

    /// Delete a directory and everything below it
    async fn delete_dir(&self, path: &str) -> bool;

    /// Create a directory, returning `None` if the backend refuses
    async fn create_dir(&self, path: &str, config: &Config) -> Option<Metadata>;

    async fn rename(&self, from: &str, to: &str) -> bool;

    async fn copy(&self, from: &str, to: &str) -> bool;

    /// Whether a file or directory exists at `path`
    async fn has(&self, path: &str) -> bool;

    /// Metadata for `path`, or `None` if it cannot be looked up
    async fn get_metadata(&self, path: &str) -> Option<Metadata>;

    async fn get_size(&self, path: &str) -> Option<u64>;

    async fn get_timestamp(&self, path: &str) -> Option<i64>;

    async fn get_mimetype(&self, path: &str) -> Result<Option<String>>;

    /// List the entries below `directory`
    async fn list_contents(&self, directory: &str, recursive: bool) -> Result<Vec<Metadata>>;
}

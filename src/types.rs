use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A boxed stream of byte chunks, used for both uploads and downloads
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Type of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

impl EntryType {
    pub fn is_file(&self) -> bool {
        matches!(self, EntryType::File)
    }
}

/// Normalized metadata record for a file or directory
///
/// All paths are relative to the adapter prefix and carry no leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Whether this is a file or a directory
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Canonical (lowercase) path, usable for follow-up calls
    pub path: String,
    /// Path with the casing the remote stores
    pub path_display: String,
    /// Leaf name with its original casing
    pub name: String,
    /// Last server-side modification, in Unix seconds (files only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Size in bytes (files only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

/// A file read fully into memory, alongside its metadata
#[derive(Debug, Clone)]
pub struct FileContents {
    pub metadata: Metadata,
    pub contents: Bytes,
}

/// A file opened for streaming, alongside its metadata
pub struct FileStream {
    pub metadata: Metadata,
    pub stream: ByteStream,
}

impl FileStream {
    /// Drain the stream into memory
    pub async fn into_contents(self) -> Result<FileContents> {
        let contents = collect_stream(self.stream).await?;
        Ok(FileContents {
            metadata: self.metadata,
            contents,
        })
    }
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Wrap an in-memory buffer as a single-chunk stream
pub fn stream_from_bytes(bytes: impl Into<Bytes>) -> ByteStream {
    let bytes = bytes.into();
    Box::pin(futures::stream::once(async move { Ok(bytes) }))
}

/// Read a stream to its end, failing on the first chunk error
pub async fn collect_stream(mut stream: ByteStream) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;

    #[test]
    fn test_metadata_serializes_type_tag() {
        let metadata = Metadata {
            entry_type: EntryType::Dir,
            path: "pass/please".to_string(),
            path_display: "pass/please".to_string(),
            name: "please".to_string(),
            timestamp: None,
            size: None,
            mimetype: None,
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "dir",
                "path": "pass/please",
                "path_display": "pass/please",
                "name": "please",
            })
        );
    }

    #[tokio::test]
    async fn test_collect_stream_concatenates_chunks() {
        let stream: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from("some")),
            Ok(Bytes::from("thing")),
        ]));

        assert_eq!(collect_stream(stream).await.unwrap(), Bytes::from("something"));
    }

    #[tokio::test]
    async fn test_collect_stream_stops_on_error() {
        let stream: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from("partial")),
            Err(AdapterError::InvalidResponse {
                message: "connection reset".to_string(),
            }),
        ]));

        assert!(matches!(
            collect_stream(stream).await,
            Err(AdapterError::InvalidResponse { .. })
        ));
    }
}

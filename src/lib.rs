pub mod adapter;
pub mod client;
pub mod config;
pub mod dropbox;
pub mod error;
pub mod filesystem;
pub mod path;
pub mod types;

pub use adapter::{normalize_entry, DropboxAdapter};
pub use client::{ApiEntry, DownloadResult, DropboxApi, ListFolderResult, WriteMode};
pub use config::{Config, DropboxConfig};
pub use dropbox::DropboxClient;
pub use error::{AdapterError, Result};
pub use filesystem::FilesystemAdapter;
pub use types::{
    collect_stream, stream_from_bytes, ByteStream, EntryType, FileContents, FileStream, Metadata,
};

use thiserror::Error;

/// Errors that can occur while talking to Dropbox
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Request rejected ({status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("Remote service error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: &'static str },
}

impl AdapterError {
    /// HTTP status carried by a remote rejection, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AdapterError::BadRequest { status, .. } | AdapterError::Remote { status, .. } => {
                Some(*status)
            }
            AdapterError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the remote reported that the path does not exist
    ///
    /// Dropbox answers lookups on missing paths with a 409 whose summary
    /// starts with `path/not_found` (or `path_lookup/not_found`).
    pub fn is_not_found(&self) -> bool {
        match self {
            AdapterError::BadRequest { status, message } => {
                *status == 404 || (*status == 409 && message.contains("not_found"))
            }
            _ => false,
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

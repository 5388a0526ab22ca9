use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt, TryStreamExt};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::{
    client::{ApiEntry, DownloadResult, DropboxApi, ListFolderResult, WriteMode},
    config::DropboxConfig,
    error::{AdapterError, Result},
    types::ByteStream,
};

const API_ARG_HEADER: &str = "Dropbox-API-Arg";
const API_RESULT_HEADER: &str = "Dropbox-API-Result";

/// Dropbox API v2 client
///
/// Talks to two host families:
/// - RPC endpoints (JSON request and response) for metadata operations
/// - content endpoints (arguments in a header, bytes in the body) for uploads and downloads
#[derive(Clone)]
pub struct DropboxClient {
    client: Client,
    config: DropboxConfig,
}

#[derive(Deserialize)]
struct MetadataEnvelope {
    metadata: ApiEntry,
}

#[derive(Deserialize)]
struct TemporaryLink {
    link: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error_summary: String,
}

impl DropboxClient {
    /// Create a client from validated connection settings
    pub fn new(config: DropboxConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self { client, config })
    }

    /// Create a client for the public Dropbox endpoints
    pub fn with_token(access_token: impl Into<String>) -> Result<Self> {
        Self::new(DropboxConfig::new(access_token))
    }

    pub fn config(&self) -> &DropboxConfig {
        &self.config
    }

    fn rpc_url(&self, endpoint: &str) -> String {
        format!(
            "{}/2/files/{}",
            self.config.api_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn content_url(&self, endpoint: &str) -> String {
        format!(
            "{}/2/files/{}",
            self.config.content_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.config.access_token)
    }

    /// POST a JSON argument to an RPC endpoint and decode the JSON reply
    async fn rpc<A, T>(&self, endpoint: &str, args: &A) -> Result<T>
    where
        A: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(endpoint, "dropbox rpc");

        let response = self
            .authorized(self.client.post(self.rpc_url(endpoint)))
            .json(args)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// POST to a content endpoint with the argument carried in a header
    fn content_request<A: Serialize>(&self, endpoint: &str, args: &A) -> Result<RequestBuilder> {
        let arg = header_safe_json(&serde_json::to_value(args)?);

        Ok(self
            .authorized(self.client.post(self.content_url(endpoint)))
            .header(API_ARG_HEADER, arg))
    }

    async fn send_upload(&self, path: &str, body: Body, mode: WriteMode) -> Result<ApiEntry> {
        debug!(path, ?mode, "dropbox upload");

        let args = json!({
            "path": path,
            "mode": mode,
            "autorename": false,
            "mute": false,
        });

        let response = self
            .content_request("upload", &args)?
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let entry: ApiEntry = response.json().await?;
        Ok(with_default_tag(entry, "file"))
    }
}

/// Map non-success statuses onto the error taxonomy
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.error_summary)
        .unwrap_or(text);

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(AdapterError::Remote {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(AdapterError::BadRequest {
            status: status.as_u16(),
            message,
        })
    }
}

/// Upload and download results are bare file records without a `.tag`
fn with_default_tag(mut entry: ApiEntry, tag: &str) -> ApiEntry {
    if entry.tag.is_empty() {
        entry.tag = tag.to_string();
    }
    entry
}

/// Serialize JSON for an HTTP header, escaping every non-ASCII character
pub(crate) fn header_safe_json(value: &serde_json::Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());

    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }

    out
}

#[async_trait]
impl DropboxApi for DropboxClient {
    async fn upload(&self, path: &str, contents: Bytes, mode: WriteMode) -> Result<ApiEntry> {
        self.send_upload(path, Body::from(contents), mode).await
    }

    /// Upload from a stream of chunks
    ///
    /// Chunks are forwarded by a task spawned with `tokio::spawn`, so this
    /// must be called from within a Tokio runtime.
    async fn upload_stream(
        &self,
        path: &str,
        mut contents: ByteStream,
        mode: WriteMode,
    ) -> Result<ApiEntry> {
        // reqwest needs a Sync body stream; forward chunks through a channel
        let (mut tx, rx) = futures::channel::mpsc::channel::<Result<Bytes>>(8);
        tokio::spawn(async move {
            while let Some(chunk) = contents.next().await {
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
        });

        self.send_upload(path, Body::wrap_stream(rx), mode).await
    }

    async fn download(&self, path: &str) -> Result<DownloadResult> {
        debug!(path, "dropbox download");

        let response = self
            .content_request("download", &json!({ "path": path }))?
            .send()
            .await?;
        let response = check_status(response).await?;

        let header = response
            .headers()
            .get(API_RESULT_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AdapterError::InvalidResponse {
                message: format!("download of {} returned no {} header", path, API_RESULT_HEADER),
            })?;
        let metadata = with_default_tag(serde_json::from_str(header)?, "file");

        let stream = response.bytes_stream().map_err(AdapterError::from);

        Ok(DownloadResult {
            metadata,
            stream: Box::pin(stream),
        })
    }

    async fn delete(&self, path: &str) -> Result<ApiEntry> {
        let envelope: MetadataEnvelope = self.rpc("delete_v2", &json!({ "path": path })).await?;
        Ok(envelope.metadata)
    }

    async fn move_path(&self, from: &str, to: &str) -> Result<ApiEntry> {
        let args = json!({ "from_path": from, "to_path": to, "autorename": false });
        let envelope: MetadataEnvelope = self.rpc("move_v2", &args).await?;
        Ok(envelope.metadata)
    }

    async fn copy(&self, from: &str, to: &str) -> Result<ApiEntry> {
        let args = json!({ "from_path": from, "to_path": to, "autorename": false });
        let envelope: MetadataEnvelope = self.rpc("copy_v2", &args).await?;
        Ok(envelope.metadata)
    }

    async fn create_folder(&self, path: &str) -> Result<ApiEntry> {
        let args = json!({ "path": path, "autorename": false });
        let envelope: MetadataEnvelope = self.rpc("create_folder_v2", &args).await?;
        Ok(with_default_tag(envelope.metadata, "folder"))
    }

    async fn get_metadata(&self, path: &str) -> Result<ApiEntry> {
        self.rpc("get_metadata", &json!({ "path": path })).await
    }

    async fn list_folder(&self, path: &str, recursive: bool) -> Result<ListFolderResult> {
        self.rpc("list_folder", &json!({ "path": path, "recursive": recursive }))
            .await
    }

    async fn list_folder_continue(&self, cursor: &str) -> Result<ListFolderResult> {
        self.rpc("list_folder/continue", &json!({ "cursor": cursor }))
            .await
    }

    async fn get_temporary_link(&self, path: &str) -> Result<String> {
        let link: TemporaryLink = self
            .rpc("get_temporary_link", &json!({ "path": path }))
            .await?;
        Ok(link.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> DropboxClient {
        DropboxClient::new(DropboxConfig::new("token").with_base_url(base)).unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client("http://localhost:8080/");

        assert_eq!(
            client.rpc_url("list_folder/continue"),
            "http://localhost:8080/2/files/list_folder/continue"
        );
        assert_eq!(
            client.content_url("upload"),
            "http://localhost:8080/2/files/upload"
        );
    }

    #[test]
    fn test_new_rejects_empty_token() {
        assert!(matches!(
            DropboxClient::with_token(""),
            Err(AdapterError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_header_safe_json_escapes_non_ascii() {
        let arg = header_safe_json(&json!({ "path": "/caf\u{e9}/\u{1f600}" }));
        assert_eq!(arg, r#"{"path":"/caf\u00e9/\ud83d\ude00"}"#);
        assert!(arg.is_ascii());

        // The escaped form decodes back to the same value
        let decoded: serde_json::Value = serde_json::from_str(&arg).unwrap();
        assert_eq!(decoded["path"], "/caf\u{e9}/\u{1f600}");
    }

    #[test]
    fn test_with_default_tag() {
        let entry = with_default_tag(ApiEntry::default(), "file");
        assert_eq!(entry.tag, "file");

        let entry = ApiEntry {
            tag: "folder".to_string(),
            ..Default::default()
        };
        assert_eq!(with_default_tag(entry, "file").tag, "folder");
    }
}

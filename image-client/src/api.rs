//! The three calls the client makes against the image service, and how responses are classified.

use std::fmt;

use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Longest body excerpt quoted back in a diagnostic.
const SNIPPET_LEN: usize = 200;

/// Store-assigned identifier. The client never interprets it, only displays it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ImageId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageId::Number(id) => write!(f, "{id}"),
            ImageId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    #[serde(default)]
    pub id: Option<ImageId>,
    pub name: String,
    pub storage_url: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Whatever the server said when it accepted an import. Only `message` is shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportAck {
    pub message: Option<String>,
    pub task_id: Option<String>,
}

impl ImportAck {
    fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_owned);
        ImportAck {
            message: field("message"),
            task_id: field("task_id"),
        }
    }
}

#[derive(Serialize)]
struct ImportRequest<'a> {
    folder_url: &'a str,
}

/// Transport seam for the controller.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Where the backend lives, for diagnostics.
    fn base_url(&self) -> &str;

    /// `GET /`. Any failure at all means the backend is treated as unreachable.
    async fn probe(&self) -> Result<(), ClientError>;

    /// `POST /import/google-drive`
    async fn trigger_import(&self, folder_url: &str) -> Result<ImportAck, ClientError>;

    /// `GET /images`
    async fn list_images(&self) -> Result<Vec<ImageRecord>, ClientError>;
}

/// `application/json` or any `+json` structured syntax suffix, parameters ignored.
pub fn is_structured(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn snippet(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(SNIPPET_LEN) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_owned(),
    }
}

/// Server-supplied `detail`, only trusted from a structured body.
fn error_detail(content_type: Option<&str>, body: &str) -> Option<String> {
    if !is_structured(content_type) {
        return None;
    }

    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Turn a raw response into data, or into the right [ClientError]. Bodies without a structured
/// content type are never parsed; they are only quoted in the diagnostic.
pub fn decode_body<T: DeserializeOwned>(
    status: u16,
    content_type: Option<&str>,
    body: &str,
) -> Result<T, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::ServerRejected {
            status,
            detail: error_detail(content_type, body),
        });
    }

    if !is_structured(content_type) {
        return Err(ClientError::MalformedResponse(format!(
            "expected JSON but got {}: {}",
            content_type.unwrap_or("no content type"),
            snippet(body)
        )));
    }

    serde_json::from_str(body)
        .map_err(|err| ClientError::MalformedResponse(format!("invalid response body: {err}")))
}

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        HttpBackend {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|err| ClientError::Unreachable(err.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|err| ClientError::Unreachable(err.to_string()))?;
        debug!("status={} content_type={:?} bytes={}", status, content_type, body.len());

        decode_body(status, content_type.as_deref(), &body)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn probe(&self) -> Result<(), ClientError> {
        self.send::<Value>(self.http.get(self.url("/")))
            .await
            .map(|_| ())
            .map_err(|err| match err {
                ClientError::Unreachable(_) => err,
                other => ClientError::Unreachable(format!("liveness probe failed: {other}")),
            })
    }

    async fn trigger_import(&self, folder_url: &str) -> Result<ImportAck, ClientError> {
        let request = self
            .http
            .post(self.url("/import/google-drive"))
            .json(&ImportRequest { folder_url });
        let value: Value = self.send(request).await?;

        Ok(ImportAck::from_value(&value))
    }

    async fn list_images(&self) -> Result<Vec<ImageRecord>, ClientError> {
        self.send(self.http.get(self.url("/images"))).await
    }
}

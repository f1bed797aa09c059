//! Minimal client for the public surface of the Google Drive v3 API.
//!
//! Only what the importer needs is covered: turning a shared folder URL into a folder id,
//! listing the image files inside that folder, and downloading a file's bytes.

use anyhow::{Context, Error, Result};
use bytes::Bytes;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com";

/// Drive caps `pageSize` at 1000 for `files.list`.
const PAGE_SIZE: &str = "1000";

static FOLDER_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/folders/([A-Za-z0-9_-]+)").expect("valid folder path regex"));
static ID_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").expect("valid id param regex"));
static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").expect("valid bare id regex"));

/// Extract the folder id from a shared Drive link.
///
/// Accepts `https://drive.google.com/drive/folders/<id>?usp=sharing`,
/// `https://drive.google.com/drive/u/0/folders/<id>`, `https://drive.google.com/open?id=<id>`
/// and a bare folder id.
pub fn folder_id_from_url(folder_url: &str) -> Result<String> {
    let folder_url = folder_url.trim();

    if let Some(captures) = FOLDER_PATH.captures(folder_url) {
        return Ok(captures[1].to_owned());
    }

    if let Some(captures) = ID_PARAM.captures(folder_url) {
        return Ok(captures[1].to_owned());
    }

    if BARE_ID.is_match(folder_url) {
        return Ok(folder_url.to_owned());
    }

    Err(Error::msg(format!(
        "could not find a Google Drive folder id in {folder_url:?}"
    )))
}

/// Link that renders a publicly shared file directly in the browser.
pub fn view_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=view&id={file_id}")
}

/// A file entry as returned by `files.list`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,

    /// Drive encodes int64 fields as JSON strings. Google-native documents carry no size.
    #[serde(default, deserialize_with = "size_from_string")]
    pub size: Option<u64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

fn size_from_string<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| s.parse::<u64>().map_err(serde::de::Error::custom))
        .transpose()
}

pub struct DriveClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl DriveClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_api_url(DEFAULT_API_URL, api_key)
    }

    pub fn with_api_url(api_url: &str, api_key: Option<String>) -> Self {
        DriveClient {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .context("a Google API key is required to read public Drive folders (set GOOGLE_API_KEY)")
    }

    /// List every image in the folder, following pagination until Drive stops handing out tokens.
    pub async fn list_images(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let key = self.api_key()?;
        let query = format!(
            "'{folder_id}' in parents and mimeType contains 'image/' and trashed = false"
        );
        let url = format!("{}/drive/v3/files", self.api_url);

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self.http.get(&url).query(&[
                ("q", query.as_str()),
                ("fields", "nextPageToken,files(id,name,mimeType,size)"),
                ("pageSize", PAGE_SIZE),
                ("key", key),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .context("failed to reach the Drive API")?;
            let response = check_status(response, folder_id).await?;
            let page: FileList = response
                .json()
                .await
                .context("failed to decode Drive file listing")?;

            debug!("folder={} page returned {} files", folder_id, page.files.len());
            files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!("folder={} contains {} images", folder_id, files.len());
        Ok(files)
    }

    /// Download the raw bytes of a file.
    pub async fn download(&self, file_id: &str) -> Result<Bytes> {
        let key = self.api_key()?;
        let url = format!("{}/drive/v3/files/{}", self.api_url, file_id);

        let response = self
            .http
            .get(url)
            .query(&[("alt", "media"), ("key", key)])
            .send()
            .await
            .with_context(|| format!("failed to download file {file_id}"))?;
        let response = check_status(response, file_id).await?;

        response
            .bytes()
            .await
            .with_context(|| format!("failed to read body of file {file_id}"))
    }
}

async fn check_status(response: reqwest::Response, target: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reason = match status {
        StatusCode::NOT_FOUND => "not found or not shared publicly",
        StatusCode::FORBIDDEN => "access denied or quota exceeded",
        StatusCode::BAD_REQUEST => "request rejected",
        _ => "unexpected response",
    };

    Err(Error::msg(format!(
        "Drive API {reason} for {target} (status {}): {}",
        status.as_u16(),
        body.trim()
    )))
}

#[cfg(test)]
mod test {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::{folder_id_from_url, view_url, DriveClient, DriveFile, FileList};

    /// Serve the canned `(status line, JSON body)` responses in order, one connection each.
    /// The handle yields the request line of every request received.
    async fn fake_drive(
        responses: Vec<(&'static str, &'static str)>,
    ) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut request_lines = Vec::new();
            for (status_line, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request: Vec<u8> = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                let head = String::from_utf8_lossy(&request);
                request_lines.push(head.lines().next().unwrap_or_default().to_owned());

                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            request_lines
        });

        (format!("http://{addr}"), handle)
    }

    #[test]
    pub fn folder_ids() {
        assert_eq!(
            folder_id_from_url("https://drive.google.com/drive/folders/1AbC-dEf_123?usp=sharing")
                .unwrap(),
            "1AbC-dEf_123"
        );
        assert_eq!(
            folder_id_from_url("https://drive.google.com/drive/u/0/folders/0Bx9yZ_wq-77aaaa")
                .unwrap(),
            "0Bx9yZ_wq-77aaaa"
        );
        assert_eq!(
            folder_id_from_url("https://drive.google.com/open?id=1q2w3e4r5t6y").unwrap(),
            "1q2w3e4r5t6y"
        );
        assert_eq!(
            folder_id_from_url("  1q2w3e4r5t6y7u8i  ").unwrap(),
            "1q2w3e4r5t6y7u8i"
        );
    }

    #[test]
    pub fn rejects_urls_without_folder() {
        assert!(folder_id_from_url("https://example.com/photos").is_err());
        assert!(folder_id_from_url("not a url").is_err());
        assert!(folder_id_from_url("").is_err());
    }

    #[test]
    pub fn file_listing_serde() {
        let page: FileList = serde_json::from_str(
            r#"
            {
                "nextPageToken": "abc",
                "files": [
                    {"id": "f1", "name": "cat.jpg", "mimeType": "image/jpeg", "size": "204800"},
                    {"id": "f2", "name": "drawing", "mimeType": "image/svg+xml"}
                ]
            }
        "#,
        )
        .unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        assert_eq!(
            page.files,
            vec![
                DriveFile {
                    id: "f1".to_owned(),
                    name: "cat.jpg".to_owned(),
                    mime_type: "image/jpeg".to_owned(),
                    size: Some(204800),
                },
                DriveFile {
                    id: "f2".to_owned(),
                    name: "drawing".to_owned(),
                    mime_type: "image/svg+xml".to_owned(),
                    size: None,
                },
            ]
        );

        let last: FileList = serde_json::from_str(r#"{"files": []}"#).unwrap();
        assert!(last.next_page_token.is_none());
    }

    #[test]
    pub fn view_links() {
        assert_eq!(
            view_url("f1"),
            "https://drive.google.com/uc?export=view&id=f1"
        );
    }

    #[tokio::test]
    async fn listing_requires_api_key() {
        let client = DriveClient::new(None);
        let err = client.list_images("folder").await.unwrap_err();
        assert!(err.to_string().contains("API key"));

        let client = DriveClient::new(Some(String::new()));
        assert!(client.download("f1").await.is_err());
    }

    #[tokio::test]
    async fn listing_follows_page_tokens() {
        let (url, requests) = fake_drive(vec![
            (
                "200 OK",
                r#"{"nextPageToken":"p2","files":[{"id":"a","name":"a.jpg","mimeType":"image/jpeg","size":"10"}]}"#,
            ),
            (
                "200 OK",
                r#"{"files":[{"id":"b","name":"b.png","mimeType":"image/png"}]}"#,
            ),
        ])
        .await;

        let client = DriveClient::with_api_url(&format!("{url}/"), Some("k".to_owned()));
        let files = client.list_images("folder1").await.unwrap();
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(files[0].size, Some(10));

        let requests = requests.await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("GET /drive/v3/files?"));
        assert!(requests[0].contains("key=k"));
        assert!(!requests[0].contains("pageToken"));
        assert!(requests[1].contains("pageToken=p2"));
    }

    #[tokio::test]
    async fn unshared_folder_and_quota_errors_are_explained() {
        let (url, _) = fake_drive(vec![(
            "404 Not Found",
            r#"{"error":{"code":404,"message":"File not found: folder1."}}"#,
        )])
        .await;
        let err = DriveClient::with_api_url(&url, Some("k".to_owned()))
            .list_images("folder1")
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("not shared publicly"));
        assert!(err.contains("folder1"));
        assert!(err.contains("status 404"));

        let (url, _) = fake_drive(vec![(
            "403 Forbidden",
            r#"{"error":{"code":403,"message":"Daily Limit Exceeded"}}"#,
        )])
        .await;
        let err = DriveClient::with_api_url(&url, Some("k".to_owned()))
            .download("f1")
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("quota exceeded"));
        assert!(err.contains("Daily Limit Exceeded"));
    }
}

//! Catalog and upload client
//!
//! Thin glue over the backend REST API:
//! - `GET  {base}/videos`         -> `{"videos": [..]}`
//! - `GET  {base}/live`           -> `{"live": [..]}`
//! - `POST {base}/videos/upload`  multipart `file` + `name`
//!
//! [`Catalog`] keeps both listings and the current selection. A failed live
//! listing degrades to an empty list and never blocks the video listing.

use crate::{ContentKind, ContentRef, Error, PlayerConfig, Result};
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument, warn};
use url::Url;

/// Server acknowledgement of a finished upload and transcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Identifier the server stored the video under
    pub video: String,
    /// Path of the new manifest endpoint
    pub playlist: String,
}

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    videos: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct LiveList {
    #[serde(default)]
    live: Option<Vec<String>>,
}

/// Catalog and upload operations
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Identifiers of playable videos
    async fn list_videos(&self) -> Result<Vec<String>>;

    /// Identifiers of active live streams
    async fn list_live(&self) -> Result<Vec<String>>;

    /// Upload a file for transcoding under `name`
    async fn upload(&self, path: &Path, name: &str) -> Result<UploadReceipt>;
}

/// Name an upload is stored under: the file name without its last extension
pub fn upload_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Upload(format!("Cannot derive a video name from {}", path.display())))
}

/// reqwest-backed [`CatalogApi`]
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base: Url,
}

impl HttpCatalogClient {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Build a client with the configured timeout
    pub fn from_config(config: &PlayerConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self::new(client, config.api_base_url.clone()))
    }

    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidConfig(format!("base address cannot carry a path: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    #[instrument(skip(self))]
    async fn list_videos(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.endpoint(&["videos"])?).send().await?;
        if !response.status().is_success() {
            return Err(Error::Catalog("Failed to fetch videos".into()));
        }
        let list: VideoList = response.json().await?;
        Ok(list.videos.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn list_live(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.endpoint(&[ContentKind::Live.endpoint()])?).send().await?;
        if !response.status().is_success() {
            return Err(Error::Catalog("Failed to fetch live streams".into()));
        }
        let list: LiveList = response.json().await?;
        Ok(list.live.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn upload(&self, path: &Path, name: &str) -> Result<UploadReceipt> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name)
            .to_string();

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(data).file_name(file_name))
            .text("name", name.to_string());

        let response = self
            .client
            .post(self.endpoint(&["videos", "upload"])?)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.trim();
            return Err(Error::Upload(if text.is_empty() {
                "Upload failed".to_string()
            } else {
                text.to_string()
            }));
        }

        Ok(response.json().await?)
    }
}

/// Listings plus the current selection
pub struct Catalog<A: CatalogApi> {
    api: A,
    videos: Vec<String>,
    live: Vec<String>,
    selection: Option<ContentRef>,
}

impl<A: CatalogApi> Catalog<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            videos: Vec::new(),
            live: Vec::new(),
            selection: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn videos(&self) -> &[String] {
        &self.videos
    }

    pub fn live(&self) -> &[String] {
        &self.live
    }

    pub fn selection(&self) -> Option<&ContentRef> {
        self.selection.as_ref()
    }

    /// Select one item. VOD and live selections replace each other.
    pub fn select(&mut self, content: ContentRef) {
        info!(content = %content, "Selected");
        self.selection = Some(content);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Fetch both listings concurrently.
    ///
    /// The live list is always updated (empty on failure). A video listing
    /// failure is returned after that. With nothing selected yet, the first
    /// video becomes the selection.
    pub async fn refresh(&mut self) -> Result<()> {
        let (videos, live) = tokio::join!(self.api.list_videos(), self.api.list_live());

        self.live = live.unwrap_or_else(|e| {
            warn!(error = %e, "Live stream listing failed");
            Vec::new()
        });

        let videos = videos?;
        if self.selection.is_none() {
            if let Some(first) = videos.first() {
                self.selection = Some(ContentRef::vod(first.clone()));
            }
        }
        self.videos = videos;

        info!(videos = self.videos.len(), live = self.live.len(), "Catalog refreshed");
        Ok(())
    }

    /// Upload `path`, refresh the listings and select the new video
    pub async fn upload_and_select(&mut self, path: &Path) -> Result<UploadReceipt> {
        let name = upload_name(path)?;
        let receipt = self.api.upload(path, &name).await?;
        info!(video = %receipt.video, "Upload complete");

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Catalog refresh after upload failed");
        }
        self.select(ContentRef::vod(receipt.video.clone()));
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubApi {
        videos: Mutex<Option<Vec<String>>>,
        live: Option<Vec<String>>,
        uploads: Mutex<Vec<(PathBuf, String)>>,
        upload_error: Option<String>,
    }

    #[async_trait]
    impl CatalogApi for StubApi {
        async fn list_videos(&self) -> Result<Vec<String>> {
            self.videos
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| Error::Catalog("Failed to fetch videos".into()))
        }

        async fn list_live(&self) -> Result<Vec<String>> {
            self.live
                .clone()
                .ok_or_else(|| Error::Catalog("Failed to fetch live streams".into()))
        }

        async fn upload(&self, path: &Path, name: &str) -> Result<UploadReceipt> {
            if let Some(msg) = &self.upload_error {
                return Err(Error::Upload(msg.clone()));
            }
            self.uploads.lock().unwrap().push((path.to_path_buf(), name.to_string()));
            let mut videos = self.videos.lock().unwrap();
            videos.get_or_insert_with(Vec::new).push(name.to_string());
            Ok(UploadReceipt {
                video: name.to_string(),
                playlist: format!("/api/videos/{name}/stream"),
            })
        }
    }

    fn videos(names: &[&str]) -> Mutex<Option<Vec<String>>> {
        Mutex::new(Some(names.iter().map(|s| s.to_string()).collect()))
    }

    #[test]
    fn test_upload_name_strips_last_extension() {
        assert_eq!(upload_name(Path::new("/tmp/lecture1.mp4")).unwrap(), "lecture1");
        assert_eq!(upload_name(Path::new("talk.final.mov")).unwrap(), "talk.final");
        assert_eq!(upload_name(Path::new("noext")).unwrap(), "noext");
        assert!(upload_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_endpoints() {
        let client = HttpCatalogClient::new(Client::new(), Url::parse("http://localhost:8080/api/").unwrap());
        assert_eq!(
            client.endpoint(&["videos", "upload"]).unwrap().as_str(),
            "http://localhost:8080/api/videos/upload"
        );
        assert_eq!(client.endpoint(&["live"]).unwrap().as_str(), "http://localhost:8080/api/live");
    }

    #[test]
    fn test_null_lists_decode_empty() {
        let list: VideoList = serde_json::from_str(r#"{"videos": null}"#).unwrap();
        assert!(list.videos.unwrap_or_default().is_empty());
        let list: LiveList = serde_json::from_str("{}").unwrap();
        assert!(list.live.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_live_failure_does_not_block_videos() {
        let api = StubApi {
            videos: videos(&["lecture1", "lecture2"]),
            live: None,
            ..Default::default()
        };
        let mut catalog = Catalog::new(api);

        catalog.refresh().await.unwrap();
        assert_eq!(catalog.videos(), ["lecture1", "lecture2"]);
        assert!(catalog.live().is_empty());
        assert_eq!(catalog.selection(), Some(&ContentRef::vod("lecture1")));
    }

    #[tokio::test]
    async fn test_video_failure_still_updates_live() {
        let api = StubApi {
            videos: Mutex::new(None),
            live: Some(vec!["channel2".into()]),
            ..Default::default()
        };
        let mut catalog = Catalog::new(api);

        let err = catalog.refresh().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch videos");
        assert_eq!(catalog.live(), ["channel2"]);
        assert!(catalog.selection().is_none());
    }

    #[tokio::test]
    async fn test_refresh_keeps_existing_selection() {
        let api = StubApi {
            videos: videos(&["lecture1"]),
            live: Some(vec!["channel2".into()]),
            ..Default::default()
        };
        let mut catalog = Catalog::new(api);
        catalog.select(ContentRef::live("channel2"));

        catalog.refresh().await.unwrap();
        assert_eq!(catalog.selection(), Some(&ContentRef::live("channel2")));
    }

    #[tokio::test]
    async fn test_upload_refreshes_and_selects() {
        let api = StubApi {
            videos: videos(&["lecture1"]),
            live: Some(vec!["channel2".into()]),
            ..Default::default()
        };
        let mut catalog = Catalog::new(api);
        catalog.select(ContentRef::live("channel2"));

        let receipt = catalog.upload_and_select(Path::new("/tmp/keynote.mp4")).await.unwrap();
        assert_eq!(receipt.video, "keynote");
        assert_eq!(catalog.videos(), ["lecture1", "keynote"]);
        assert_eq!(catalog.selection(), Some(&ContentRef::vod("keynote")));
        assert_eq!(catalog.api().uploads.lock().unwrap()[0].1, "keynote");
    }

    #[tokio::test]
    async fn test_upload_error_text_surfaces() {
        let api = StubApi {
            videos: videos(&[]),
            live: Some(Vec::new()),
            upload_error: Some("ffmpeg not installed".into()),
            ..Default::default()
        };
        let mut catalog = Catalog::new(api);

        let err = catalog.upload_and_select(Path::new("clip.mov")).await.unwrap_err();
        assert_eq!(err.to_string(), "ffmpeg not installed");
        assert!(catalog.selection().is_none());
    }
}

//! HLS manifest fetching and parsing for the headless engine

use crate::{Error, Result};
use m3u8_rs::Playlist;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Playlist flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistType {
    /// Multivariant playlist listing renditions
    Master,
    /// Segment playlist
    Media,
}

/// Parsed manifest data
#[derive(Debug, Clone)]
pub struct Manifest {
    pub playlist_type: PlaylistType,
    /// Variant playlist URLs, lowest bandwidth first (master only)
    pub variants: Vec<Url>,
    /// Segment URLs in playback order (media only)
    pub segments: Vec<Url>,
    /// No `#EXT-X-ENDLIST` seen (media only)
    pub is_live: bool,
    /// Target segment duration
    pub target_duration: Duration,
    /// Base URL for resolving relative URIs
    pub base_url: Url,
}

impl Manifest {
    /// First segment to probe for playability
    pub fn first_segment(&self) -> Option<&Url> {
        self.segments.first()
    }
}

/// Parse a playlist body fetched from `base_url`
pub fn parse_manifest(content: &[u8], base_url: &Url) -> Result<Manifest> {
    let parsed = m3u8_rs::parse_playlist_res(content)
        .map_err(|e| Error::ManifestParse(format!("Failed to parse HLS playlist: {:?}", e)))?;

    match parsed {
        Playlist::MasterPlaylist(master) => {
            let mut variants: Vec<(u64, Url)> = master
                .variants
                .iter()
                .filter(|v| !v.is_i_frame)
                .map(|v| Ok((v.bandwidth, resolve_uri(base_url, &v.uri)?)))
                .collect::<Result<_>>()?;
            variants.sort_by_key(|(bandwidth, _)| *bandwidth);

            Ok(Manifest {
                playlist_type: PlaylistType::Master,
                variants: variants.into_iter().map(|(_, uri)| uri).collect(),
                segments: Vec::new(),
                is_live: false,
                target_duration: Duration::from_secs(6),
                base_url: base_url.clone(),
            })
        }
        Playlist::MediaPlaylist(media) => {
            let segments = media
                .segments
                .iter()
                .map(|s| resolve_uri(base_url, &s.uri))
                .collect::<Result<Vec<_>>>()?;

            Ok(Manifest {
                playlist_type: PlaylistType::Media,
                variants: Vec::new(),
                segments,
                is_live: !media.end_list,
                target_duration: Duration::from_secs_f64(media.target_duration as f64),
                base_url: base_url.clone(),
            })
        }
    }
}

/// Resolve a possibly relative URI against the playlist URL
fn resolve_uri(base_url: &Url, uri: &str) -> Result<Url> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        Ok(Url::parse(uri)?)
    } else {
        Ok(base_url.join(uri)?)
    }
}

/// GET and parse a playlist
#[instrument(skip(client))]
pub async fn fetch_manifest(client: &Client, url: &Url) -> Result<Manifest> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::ManifestFetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::ManifestFetch(format!("HTTP {} for {}", status, url)));
    }

    // Redirects land the playlist somewhere else; relative URIs follow it.
    let base_url = response.url().clone();
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::ManifestFetch(e.to_string()))?;

    let manifest = parse_manifest(&body, &base_url)?;
    debug!(
        playlist = ?manifest.playlist_type,
        variants = manifest.variants.len(),
        segments = manifest.segments.len(),
        is_live = manifest.is_live,
        "Manifest parsed"
    );
    Ok(manifest)
}

//! Headless streaming engine and surface
//!
//! A real [`StreamingEngine`] for hosts without a display (CLI, probes,
//! monitoring): it fetches and parses the manifest over HTTP, probes the
//! first segment, and reports back through a tokio channel using the same
//! event vocabulary as a browser engine. No media is decoded.
//!
//! Reloads requested through `start_load` back off exponentially
//! (`EngineConfig::retry_delay`); the counter resets once a fragment loads.

use crate::{
    engine::{EngineEvent, EngineFactory, PlayRejected, PlaybackEvent, RenderingSurface, StreamingEngine},
    fault::RawFault,
    manifest::{fetch_manifest, Manifest, PlaylistType},
    EngineConfig, EngineHandleId, Error,
};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

/// Sender side of the event channel a host drains into its session
pub type EventSender = mpsc::UnboundedSender<PlaybackEvent>;

/// Builds [`HeadlessEngine`]s sharing one HTTP client and event channel
#[derive(Clone)]
pub struct HeadlessEngineFactory {
    client: Client,
    events: EventSender,
}

impl HeadlessEngineFactory {
    pub fn new(client: Client, events: EventSender) -> Self {
        Self { client, events }
    }
}

impl EngineFactory for HeadlessEngineFactory {
    fn is_supported(&self) -> bool {
        true
    }

    fn create(&self, id: EngineHandleId, config: &EngineConfig) -> Box<dyn StreamingEngine> {
        Box::new(HeadlessEngine::new(id, self.client.clone(), self.events.clone(), config.clone()))
    }
}

/// Manifest-level engine driven by tokio tasks.
///
/// Loading begins once both a source and a surface are set, matching the
/// order-independent `loadSource`/`attachMedia` contract of browser engines.
pub struct HeadlessEngine {
    id: EngineHandleId,
    client: Client,
    events: EventSender,
    config: EngineConfig,
    source: Option<Url>,
    attached: bool,
    destroyed: bool,
    manifest_parsed: Arc<AtomicBool>,
    /// Loads started since the last buffered fragment
    attempts: Arc<AtomicU32>,
    task: Option<JoinHandle<()>>,
}

impl HeadlessEngine {
    pub fn new(id: EngineHandleId, client: Client, events: EventSender, config: EngineConfig) -> Self {
        Self {
            id,
            client,
            events,
            config,
            source: None,
            attached: false,
            destroyed: false,
            manifest_parsed: Arc::new(AtomicBool::new(false)),
            attempts: Arc::new(AtomicU32::new(0)),
            task: None,
        }
    }

    fn emit(&self, event: EngineEvent) {
        // The receiver is gone once the host stops listening; nothing left to notify.
        let _ = self.events.send(PlaybackEvent::engine(self.id, event));
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn begin_loading(&mut self) {
        if self.destroyed || !self.attached {
            return;
        }
        let Some(url) = self.source.clone() else {
            return;
        };

        self.abort_task();
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        let delay = self.config.retry_delay(attempt);
        debug!(handle = %self.id, url = %url, attempt, delay_ms = delay.as_millis() as u64, "Loading manifest");

        let loader = Loader {
            id: self.id,
            client: self.client.clone(),
            events: self.events.clone(),
            manifest_parsed: self.manifest_parsed.clone(),
            attempts: self.attempts.clone(),
            live_edge: self.config.low_latency_mode,
        };
        self.task = Some(tokio::spawn(loader.run(url, delay)));
    }
}

impl StreamingEngine for HeadlessEngine {
    fn id(&self) -> EngineHandleId {
        self.id
    }

    fn load_source(&mut self, url: &Url) {
        self.source = Some(url.clone());
        self.manifest_parsed.store(false, Ordering::SeqCst);
        self.attempts.store(0, Ordering::SeqCst);
        self.begin_loading();
    }

    fn attach_media(&mut self, surface: &mut dyn RenderingSurface) {
        if self.destroyed || self.attached {
            return;
        }
        surface.set_source(self.source.as_ref());
        self.attached = true;
        self.begin_loading();
    }

    fn detach_media(&mut self, surface: &mut dyn RenderingSurface) {
        if !self.attached {
            return;
        }
        self.abort_task();
        surface.set_source(None);
        self.attached = false;
    }

    fn start_load(&mut self) {
        self.begin_loading();
    }

    fn recover_media_error(&mut self) {
        if self.destroyed {
            return;
        }
        // Nothing is decoded here, so a parsed manifest means the pipeline is intact.
        if self.manifest_parsed.load(Ordering::SeqCst) {
            self.emit(EngineEvent::FragmentBuffered);
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        info!(handle = %self.id, "Engine destroyed");
        self.abort_task();
        self.destroyed = true;
        self.attached = false;
    }
}

impl Drop for HeadlessEngine {
    fn drop(&mut self) {
        self.abort_task();
    }
}

/// State shared with one spawned load
struct Loader {
    id: EngineHandleId,
    client: Client,
    events: EventSender,
    manifest_parsed: Arc<AtomicBool>,
    attempts: Arc<AtomicU32>,
    /// Probe the newest segment of a live playlist instead of the oldest
    live_edge: bool,
}

impl Loader {
    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(PlaybackEvent::engine(self.id, event));
    }

    /// Wait out the backoff, fetch the manifest, then probe one segment
    async fn run(self, url: Url, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let manifest = match fetch_manifest(&self.client, &url).await {
            Ok(manifest) => manifest,
            Err(e) => {
                self.emit(EngineEvent::Error(manifest_fault(&e)));
                return;
            }
        };
        self.manifest_parsed.store(true, Ordering::SeqCst);
        self.emit(EngineEvent::ManifestParsed);

        let segment = match self.start_segment(&manifest).await {
            Ok(Some(segment)) => segment,
            Ok(None) => return,
            Err(e) => {
                self.emit(EngineEvent::Error(RawFault::network(false, format!("levelLoadError: {}", e))));
                return;
            }
        };

        let probe = self
            .client
            .get(segment)
            .send()
            .await
            .and_then(|response| response.error_for_status());
        match probe {
            Ok(_) => {
                self.attempts.store(0, Ordering::SeqCst);
                self.emit(EngineEvent::FragmentBuffered);
            }
            Err(e) => self.emit(EngineEvent::Error(RawFault::network(
                false,
                format!("fragLoadError: {}", e),
            ))),
        }
    }

    /// Segment to probe, following the lowest variant of a master playlist
    async fn start_segment(&self, manifest: &Manifest) -> crate::Result<Option<Url>> {
        let level = match manifest.playlist_type {
            PlaylistType::Media => None,
            PlaylistType::Master => {
                let Some(variant) = manifest.variants.first() else {
                    return Ok(None);
                };
                Some(fetch_manifest(&self.client, variant).await?)
            }
        };
        let media = level.as_ref().unwrap_or(manifest);

        let segment = if self.live_edge && media.is_live {
            media.segments.last()
        } else {
            media.first_segment()
        };
        Ok(segment.cloned())
    }
}

fn manifest_fault(error: &Error) -> RawFault {
    match error {
        Error::ManifestParse(detail) => {
            RawFault::other("manifestParsingError", true, detail.clone())
        }
        other => RawFault::network(true, format!("manifestLoadError: {}", other)),
    }
}

/// Surface for hosts without a display.
///
/// Has no native HLS support, accepts every play request, and remembers
/// what was asked of it.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    source: Option<Url>,
    play_requests: u32,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<&Url> {
        self.source.as_ref()
    }

    pub fn play_requests(&self) -> u32 {
        self.play_requests
    }
}

impl RenderingSurface for HeadlessSurface {
    fn can_play_type(&self, _mime_type: &str) -> bool {
        false
    }

    fn set_source(&mut self, url: Option<&Url>) {
        self.source = url.cloned();
    }

    fn play(&mut self) -> std::result::Result<(), PlayRejected> {
        self.play_requests += 1;
        Ok(())
    }
}

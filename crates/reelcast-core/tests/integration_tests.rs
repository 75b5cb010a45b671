//! Integration tests for Reelcast Core

use reelcast_core::{
    ContentRef, EngineConfig, EngineEvent, EngineFactory, EngineHandleId, Error, FaultKind,
    PlayRejected, PlaybackEvent, PlaybackSession, PlaybackStatus, PlayerConfig, RawFault,
    RenderingSurface, SourceResolver, StreamingEngine, SurfaceEvent, HLS_MIME_TYPE,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tokio_test::{assert_err, assert_ok};
use url::Url;

// =============================================================================
// Test doubles
// =============================================================================

/// Everything the fake engines and surface observed
#[derive(Default)]
struct Recorder {
    created: Vec<EngineHandleId>,
    destroyed: Vec<EngineHandleId>,
    attached: HashSet<EngineHandleId>,
    max_attached: usize,
    loaded: Vec<(EngineHandleId, Url)>,
    start_loads: Vec<EngineHandleId>,
    media_recoveries: Vec<EngineHandleId>,
}

impl Recorder {
    fn live_engines(&self) -> usize {
        self.created.len() - self.destroyed.len()
    }
}

struct FakeEngine {
    id: EngineHandleId,
    recorder: Rc<RefCell<Recorder>>,
}

impl StreamingEngine for FakeEngine {
    fn id(&self) -> EngineHandleId {
        self.id
    }

    fn load_source(&mut self, url: &Url) {
        self.recorder.borrow_mut().loaded.push((self.id, url.clone()));
    }

    fn attach_media(&mut self, surface: &mut dyn RenderingSurface) {
        let mut rec = self.recorder.borrow_mut();
        assert!(rec.attached.is_empty(), "surface already has an engine attached");
        rec.attached.insert(self.id);
        rec.max_attached = rec.max_attached.max(rec.attached.len());
        surface.set_source(Some(&Url::parse("blob:media-source").unwrap()));
    }

    fn detach_media(&mut self, surface: &mut dyn RenderingSurface) {
        self.recorder.borrow_mut().attached.remove(&self.id);
        surface.set_source(None);
    }

    fn start_load(&mut self) {
        self.recorder.borrow_mut().start_loads.push(self.id);
    }

    fn recover_media_error(&mut self) {
        self.recorder.borrow_mut().media_recoveries.push(self.id);
    }

    fn destroy(&mut self) {
        let mut rec = self.recorder.borrow_mut();
        assert!(!rec.destroyed.contains(&self.id), "engine destroyed twice");
        assert!(!rec.attached.contains(&self.id), "engine destroyed while attached");
        rec.destroyed.push(self.id);
    }
}

struct FakeFactory {
    supported: bool,
    recorder: Rc<RefCell<Recorder>>,
}

impl EngineFactory for FakeFactory {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&self, id: EngineHandleId, _config: &EngineConfig) -> Box<dyn StreamingEngine> {
        self.recorder.borrow_mut().created.push(id);
        Box::new(FakeEngine {
            id,
            recorder: self.recorder.clone(),
        })
    }
}

#[derive(Default)]
struct FakeSurface {
    native_hls: bool,
    autoplay_blocked: bool,
    source: Option<Url>,
    play_calls: u32,
}

impl RenderingSurface for FakeSurface {
    fn can_play_type(&self, mime_type: &str) -> bool {
        self.native_hls && mime_type == HLS_MIME_TYPE
    }

    fn set_source(&mut self, url: Option<&Url>) {
        self.source = url.cloned();
    }

    fn play(&mut self) -> Result<(), PlayRejected> {
        self.play_calls += 1;
        if self.autoplay_blocked {
            Err(PlayRejected::new("NotAllowedError"))
        } else {
            Ok(())
        }
    }
}

struct Harness {
    session: PlaybackSession<FakeSurface>,
    recorder: Rc<RefCell<Recorder>>,
}

impl Harness {
    fn new(engine_supported: bool, surface: FakeSurface) -> Self {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let factory = FakeFactory {
            supported: engine_supported,
            recorder: recorder.clone(),
        };
        let session = PlaybackSession::from_config(&PlayerConfig::default(), Box::new(factory), surface);
        Self { session, recorder }
    }

    fn engine() -> Self {
        Self::new(true, FakeSurface::default())
    }

    fn handle(&self) -> EngineHandleId {
        self.session.engine_handle().expect("live handle")
    }

    fn engine_event(&mut self, event: EngineEvent) {
        let handle = self.handle();
        self.session.handle_event(PlaybackEvent::engine(handle, event));
    }

    fn surface_event(&mut self, event: SurfaceEvent) {
        let handle = self.handle();
        self.session.handle_event(PlaybackEvent::surface(handle, event));
    }

    fn status(&self) -> PlaybackStatus {
        self.session.status().clone()
    }
}

// =============================================================================
// Source Resolver
// =============================================================================

fn resolver() -> SourceResolver {
    SourceResolver::new(PlayerConfig::default().api_base_url)
}

#[test]
fn test_empty_identifier_is_invalid() {
    for content in [ContentRef::vod(""), ContentRef::live("")] {
        let err = assert_err!(resolver().resolve(&content));
        assert!(matches!(err, Error::InvalidContentRef(_)));
    }
}

#[test]
fn test_vod_and_live_urls_distinct() {
    for id in ["lecture1", "channel2", "a.b-c_d~e", "with space"] {
        let vod = assert_ok!(resolver().resolve(&ContentRef::vod(id)));
        let live = assert_ok!(resolver().resolve(&ContentRef::live(id)));
        assert_ne!(vod, live);

        let encoded = id.replace(' ', "%20");
        assert!(vod.as_str().contains(&encoded));
        assert!(live.as_str().contains(&encoded));
    }
}

// =============================================================================
// Capability detection through the session
// =============================================================================

#[test]
fn test_engine_chosen_when_both_available() {
    let surface = FakeSurface {
        native_hls: true,
        ..Default::default()
    };
    let mut h = Harness::new(true, surface);

    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    assert!(h.session.has_engine());
    assert_eq!(h.recorder.borrow().created.len(), 1);
}

#[test]
fn test_native_fallback() {
    let surface = FakeSurface {
        native_hls: true,
        ..Default::default()
    };
    let mut h = Harness::new(false, surface);

    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    assert_eq!(h.status(), PlaybackStatus::Loading);
    assert!(!h.session.has_engine());
    assert!(h.recorder.borrow().created.is_empty());
    assert_eq!(
        h.session.surface().source.as_ref().unwrap().as_str(),
        "http://localhost:8080/api/videos/lecture1/stream"
    );

    h.surface_event(SurfaceEvent::MetadataLoaded);
    assert_eq!(h.status(), PlaybackStatus::Playing);
    assert_eq!(h.session.surface().play_calls, 1);
}

#[test]
fn test_native_error_fails_session() {
    let surface = FakeSurface {
        native_hls: true,
        ..Default::default()
    };
    let mut h = Harness::new(false, surface);
    assert_ok!(h.session.start(ContentRef::live("channel2")));

    h.surface_event(SurfaceEvent::Error("MEDIA_ERR_SRC_NOT_SUPPORTED".into()));
    assert_eq!(h.status(), PlaybackStatus::Failed("Failed to load video".into()));
    assert!(h.session.surface().source.is_none());
    assert!(h.session.engine_handle().is_none());
}

#[test]
fn test_unsupported_fails_without_engine() {
    let mut h = Harness::new(false, FakeSurface::default());

    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    assert_eq!(h.status(), PlaybackStatus::Failed("playback not supported".into()));
    assert!(h.recorder.borrow().created.is_empty());
    assert!(h.session.engine_handle().is_none());
    assert!(h.session.surface().source.is_none());

    let snapshot = h.session.snapshot();
    assert!(!snapshot.loading);
    assert!(snapshot.message.is_some());
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[test]
fn test_vod_scenario_network_recovery() {
    let mut h = Harness::engine();
    assert_eq!(h.status(), PlaybackStatus::Idle);

    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    assert_eq!(h.status(), PlaybackStatus::Loading);
    {
        let rec = h.recorder.borrow();
        assert_eq!(rec.loaded.len(), 1);
        assert!(rec.loaded[0].1.as_str().ends_with("/videos/lecture1/stream"));
    }

    h.engine_event(EngineEvent::ManifestParsed);
    assert_eq!(h.status(), PlaybackStatus::Playing);
    assert!(!h.session.snapshot().loading);

    let handle = h.handle();
    h.engine_event(EngineEvent::Error(RawFault::network(false, "fragLoadError")));
    assert_eq!(h.status(), PlaybackStatus::Recovering(FaultKind::Network));
    assert_eq!(h.recorder.borrow().start_loads, vec![handle]);

    h.engine_event(EngineEvent::FragmentBuffered);
    assert_eq!(h.status(), PlaybackStatus::Playing);
    assert_eq!(h.session.engine_handle(), Some(handle));
    assert!(h.recorder.borrow().destroyed.is_empty());
}

#[test]
fn test_live_replaces_vod_and_ignores_stale_events() {
    let mut h = Harness::engine();
    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    h.engine_event(EngineEvent::ManifestParsed);
    assert_eq!(h.status(), PlaybackStatus::Playing);
    let old = h.handle();

    assert_ok!(h.session.start(ContentRef::live("channel2")));
    let new = h.handle();
    assert_ne!(old, new);
    assert_eq!(h.status(), PlaybackStatus::Loading);
    assert_eq!(h.session.content(), Some(&ContentRef::live("channel2")));
    {
        let rec = h.recorder.borrow();
        assert_eq!(rec.destroyed, vec![old]);
        assert_eq!(rec.live_engines(), 1);
        assert!(rec.loaded.last().unwrap().1.as_str().ends_with("/live/channel2/stream"));
    }

    // Late callbacks from the torn-down lecture1 engine
    h.session.handle_event(PlaybackEvent::engine(old, EngineEvent::ManifestParsed));
    h.session.handle_event(PlaybackEvent::engine(
        old,
        EngineEvent::Error(RawFault::other("otherError", true, "stale")),
    ));
    assert_eq!(h.status(), PlaybackStatus::Loading);
    assert_eq!(h.session.engine_handle(), Some(new));
    assert_eq!(h.session.surface().play_calls, 1);
}

#[test]
fn test_restart_never_double_attaches() {
    let mut h = Harness::engine();
    for id in ["a", "b", "c", "a"] {
        assert_ok!(h.session.start(ContentRef::vod(id)));
        assert_eq!(h.recorder.borrow().attached.len(), 1);
    }

    let rec = h.recorder.borrow();
    assert_eq!(rec.max_attached, 1);
    assert_eq!(rec.created.len(), 4);
    assert_eq!(rec.destroyed.len(), 3);
    assert_eq!(rec.live_engines(), 1);
}

#[test]
fn test_fatal_fault_destroys_engine() {
    let mut h = Harness::engine();
    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    h.engine_event(EngineEvent::ManifestParsed);
    let handle = h.handle();

    h.engine_event(EngineEvent::Error(RawFault::other("muxError", true, "demuxer crashed")));
    assert_eq!(h.status(), PlaybackStatus::Failed("demuxer crashed".into()));
    assert!(h.session.engine_handle().is_none());
    assert!(h.session.surface().source.is_none());
    assert_eq!(h.recorder.borrow().destroyed, vec![handle]);
    assert_eq!(
        h.session.snapshot().message.as_deref(),
        Some("Fatal error. Cannot recover.")
    );

    // Idempotent teardown: no second destroy, failure stays visible
    h.session.stop();
    h.session.stop();
    assert_eq!(h.recorder.borrow().destroyed, vec![handle]);
    assert_eq!(h.status(), PlaybackStatus::Failed("demuxer crashed".into()));

    // A late event from the destroyed engine changes nothing
    h.session.handle_event(PlaybackEvent::engine(handle, EngineEvent::FragmentBuffered));
    assert!(h.session.status().is_failed());
}

#[test]
fn test_stop_returns_to_idle() {
    let mut h = Harness::engine();
    h.session.stop();
    assert_eq!(h.status(), PlaybackStatus::Idle);

    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    h.session.stop();
    assert_eq!(h.status(), PlaybackStatus::Idle);
    assert!(h.session.engine_handle().is_none());
    assert_eq!(h.recorder.borrow().live_engines(), 0);
    assert!(h.recorder.borrow().attached.is_empty());

    h.session.stop();
    assert_eq!(h.recorder.borrow().destroyed.len(), 1);
}

#[test]
fn test_stop_while_recovering_ignores_late_progress() {
    let mut h = Harness::engine();
    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    h.engine_event(EngineEvent::Error(RawFault::media(true, "bufferAppendError")));
    assert_eq!(h.status(), PlaybackStatus::Recovering(FaultKind::Media));
    let handle = h.handle();

    h.session.stop();
    h.session.handle_event(PlaybackEvent::engine(handle, EngineEvent::FragmentBuffered));
    assert_eq!(h.status(), PlaybackStatus::Idle);
}

#[test]
fn test_fault_loop_keeps_oscillating() {
    let mut h = Harness::engine();
    assert_ok!(h.session.start(ContentRef::live("channel2")));
    h.engine_event(EngineEvent::ManifestParsed);

    for _ in 0..50 {
        h.engine_event(EngineEvent::Error(RawFault::network(true, "levelLoadError")));
        assert_eq!(h.status(), PlaybackStatus::Recovering(FaultKind::Network));
        h.engine_event(EngineEvent::FragmentBuffered);
        assert_eq!(h.status(), PlaybackStatus::Playing);
    }
    assert_eq!(h.recorder.borrow().start_loads.len(), 50);
    assert!(h.recorder.borrow().destroyed.is_empty());
}

#[test]
fn test_autoplay_rejection_keeps_playing() {
    let surface = FakeSurface {
        autoplay_blocked: true,
        ..Default::default()
    };
    let mut h = Harness::new(true, surface);
    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    h.engine_event(EngineEvent::ManifestParsed);

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.status, PlaybackStatus::Playing);
    assert!(snapshot.message.unwrap().contains("User interaction"));
}

#[test]
fn test_invalid_content_tears_down_previous() {
    let mut h = Harness::engine();
    assert_ok!(h.session.start(ContentRef::vod("lecture1")));

    let err = assert_err!(h.session.start(ContentRef::vod("")));
    assert_eq!(err.error_code(), "INVALID_CONTENT_REF");
    assert_eq!(h.status(), PlaybackStatus::Idle);
    assert_eq!(h.recorder.borrow().live_engines(), 0);
}

#[test]
fn test_dispose_detaches_surface() {
    let mut h = Harness::engine();
    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    assert!(h.session.surface().source.is_some());

    let recorder = h.recorder.clone();
    let surface = h.session.dispose();
    assert!(surface.source.is_none());
    assert_eq!(recorder.borrow().live_engines(), 0);
}

#[test]
fn test_history_tracks_scenario() {
    let mut h = Harness::engine();
    assert_ok!(h.session.start(ContentRef::vod("lecture1")));
    h.engine_event(EngineEvent::ManifestParsed);
    h.engine_event(EngineEvent::Error(RawFault::network(false, "fragLoadError")));
    h.engine_event(EngineEvent::FragmentBuffered);

    let path: Vec<PlaybackStatus> = h.session.history().map(|c| c.to.clone()).collect();
    assert_eq!(
        path,
        vec![
            PlaybackStatus::Loading,
            PlaybackStatus::Playing,
            PlaybackStatus::Recovering(FaultKind::Network),
            PlaybackStatus::Playing,
        ]
    );
}

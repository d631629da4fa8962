//! Event-driven controller tests against a scripted media source.

use bridge_traits::{
    BridgeError, ListenerId, ListenerRegistry, MediaEvent, MediaListener, MediaSignal,
    MediaSource,
};
use core_playback::{Intent, Phase, PlaybackController, PlaybackError, PlaybackRate};
use core_runtime::config::CommitPolicy;
use core_runtime::events::{ChangeReason, EventStream};
use core_runtime::{CoreEvent, EventBus, PlaybackEvent, PlayerConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const RESOURCE: &str = "/1.mp3";

// ============================================================================
// Scripted MediaSource
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Play,
    Pause,
    Seek(f64),
    Volume(f32),
    Rate(f64),
}

/// Media source whose events are pushed by the test.
struct ScriptedSource {
    resource_id: String,
    paused: AtomicBool,
    duration: Mutex<Option<f64>>,
    listeners: ListenerRegistry,
    commands: Mutex<Vec<Command>>,
    play_error: Mutex<Option<String>>,
    pause_fails: AtomicBool,
    /// Subscribe calls allowed before failing.
    subscribe_budget: Mutex<Option<usize>>,
    /// Keep listeners registered after `unsubscribe`, like a buggy platform.
    leaky: AtomicBool,
    leaked: Mutex<Vec<MediaListener>>,
    subscribe_calls: AtomicUsize,
}

impl ScriptedSource {
    fn new() -> Arc<Self> {
        Self::for_resource(RESOURCE)
    }

    fn for_resource(resource_id: &str) -> Arc<Self> {
        Arc::new(Self {
            resource_id: resource_id.to_string(),
            paused: AtomicBool::new(true),
            duration: Mutex::new(None),
            listeners: ListenerRegistry::new(),
            commands: Mutex::new(Vec::new()),
            play_error: Mutex::new(None),
            pause_fails: AtomicBool::new(false),
            subscribe_budget: Mutex::new(None),
            leaky: AtomicBool::new(false),
            leaked: Mutex::new(Vec::new()),
            subscribe_calls: AtomicUsize::new(0),
        })
    }

    fn emit(&self, event: MediaEvent) {
        self.listeners.dispatch(&event);
        let leaked: Vec<MediaListener> = self.leaked.lock().clone();
        for listener in leaked {
            listener(&event);
        }
    }

    fn load(&self, duration: f64) {
        *self.duration.lock() = Some(duration);
        self.emit(MediaEvent::MetadataLoaded {
            duration,
            current_time: 0.0,
        });
    }

    /// Run out of media, as a platform would.
    fn finish(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.emit(MediaEvent::Paused);
        self.emit(MediaEvent::Ended);
    }

    fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl MediaSource for ScriptedSource {
    fn resource_id(&self) -> String {
        self.resource_id.clone()
    }

    fn play(&self) -> bridge_traits::error::Result<()> {
        self.commands.lock().push(Command::Play);
        if let Some(reason) = self.play_error.lock().clone() {
            return Err(BridgeError::PlayRejected(reason));
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) -> bridge_traits::error::Result<()> {
        self.commands.lock().push(Command::Pause);
        if self.pause_fails.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("pause failed".into()));
        }
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn current_time(&self) -> f64 {
        0.0
    }

    fn set_current_time(&self, seconds: f64) -> bridge_traits::error::Result<()> {
        self.commands.lock().push(Command::Seek(seconds));
        Ok(())
    }

    fn duration(&self) -> Option<f64> {
        *self.duration.lock()
    }

    fn set_volume(&self, volume: f32) -> bridge_traits::error::Result<()> {
        self.commands.lock().push(Command::Volume(volume));
        Ok(())
    }

    fn set_playback_rate(&self, rate: f64) -> bridge_traits::error::Result<()> {
        self.commands.lock().push(Command::Rate(rate));
        Ok(())
    }

    fn subscribe(
        &self,
        signal: MediaSignal,
        listener: MediaListener,
    ) -> bridge_traits::error::Result<ListenerId> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut budget = self.subscribe_budget.lock();
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(BridgeError::NotAvailable("listener limit".into()));
                }
                *remaining -= 1;
            }
        }
        if self.leaky.load(Ordering::SeqCst) {
            self.leaked.lock().push(Arc::clone(&listener));
        }
        Ok(self.listeners.add(signal, listener))
    }

    fn unsubscribe(&self, id: ListenerId) -> bridge_traits::error::Result<()> {
        self.listeners.remove(id)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn controller_with(policy: CommitPolicy) -> PlaybackController {
    let config = PlayerConfig::builder()
        .resource_id(RESOURCE)
        .commit_policy(policy)
        .build()
        .unwrap();
    PlaybackController::new(config, EventBus::new(64)).unwrap()
}

fn controller() -> PlaybackController {
    controller_with(CommitPolicy::Optimistic)
}

fn drain(stream: &mut EventStream) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Some(Ok(CoreEvent::Playback(event))) = stream.try_recv() {
        events.push(event);
    }
    events
}

fn reasons(events: &[PlaybackEvent]) -> Vec<ChangeReason> {
    events
        .iter()
        .filter_map(|event| match event {
            PlaybackEvent::StateChanged { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_reference_listening_session() {
    let controller = controller();
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();

    source.load(125.0);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.duration, 125.0);
    assert_eq!(snapshot.current_time, 0.0);
    assert_eq!(snapshot.phase, Phase::Ready);

    assert!(controller.toggle_play().unwrap());
    assert!(!source.is_paused());

    source.emit(MediaEvent::TimeUpdate { current_time: 60.0 });
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.current_time, 60.0);
    assert!(snapshot.is_playing);

    source.finish();
    let snapshot = controller.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.current_time, 0.0);
    assert_eq!(snapshot.duration, 125.0);
}

#[test]
fn test_toggle_twice_restores_state() {
    let controller = controller();
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();
    let before = controller.snapshot().is_playing;

    controller.toggle_play().unwrap();
    controller.toggle_play().unwrap();

    assert_eq!(controller.snapshot().is_playing, before);
    assert_eq!(
        source.commands(),
        vec![
            Command::Volume(1.0),
            Command::Rate(1.0),
            Command::Play,
            Command::Pause
        ]
    );
}

#[test]
fn test_trailing_progress_after_end_is_ignored() {
    let controller = controller();
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();
    source.load(125.0);
    controller.toggle_play().unwrap();

    source.finish();
    source.emit(MediaEvent::TimeUpdate {
        current_time: 125.0,
    });
    assert_eq!(controller.snapshot().current_time, 0.0);

    controller.seek(10.0).unwrap();
    source.emit(MediaEvent::TimeUpdate { current_time: 11.0 });
    assert_eq!(controller.snapshot().current_time, 11.0);
}

#[test]
fn test_seek_is_optimistic() {
    let controller = controller();
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();
    source.load(125.0);

    controller.seek(42.0).unwrap();

    assert_eq!(controller.snapshot().current_time, 42.0);
    assert_eq!(source.commands().last(), Some(&Command::Seek(42.0)));
}

#[test]
fn test_synchronous_play_rejection_rolls_back() {
    let controller = controller();
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();
    *source.play_error.lock() = Some("NotAllowedError".into());
    let mut stream = EventStream::new(controller.events().subscribe());

    let playing = controller.toggle_play().unwrap();

    assert!(!playing);
    assert!(!controller.snapshot().is_playing);
    let events = drain(&mut stream);
    assert_eq!(
        reasons(&events),
        vec![ChangeReason::PlayToggled, ChangeReason::PlayRejected]
    );
    assert!(events
        .iter()
        .any(|event| matches!(event, PlaybackEvent::PlayRejected { .. })));
}

#[test]
fn test_asynchronous_play_rejection_rolls_back() {
    let controller = controller();
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();

    assert!(controller.toggle_play().unwrap());
    source.paused.store(true, Ordering::SeqCst);
    source.emit(MediaEvent::PlayRejected {
        reason: "NotAllowedError".into(),
    });

    assert!(!controller.snapshot().is_playing);
}

#[test]
fn test_pause_failure_propagates_and_resyncs() {
    let controller = controller();
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();
    controller.toggle_play().unwrap();
    source.pause_fails.store(true, Ordering::SeqCst);

    let result = controller.toggle_play();

    assert!(matches!(result, Err(PlaybackError::Bridge(_))));
    assert!(controller.snapshot().is_playing);
}

#[test]
fn test_acknowledged_policy_waits_for_playing() {
    let controller = controller_with(CommitPolicy::Acknowledged);
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();

    assert!(!controller.toggle_play().unwrap());
    assert!(controller.snapshot().play_pending);

    source.emit(MediaEvent::Playing);
    let snapshot = controller.snapshot();
    assert!(snapshot.is_playing);
    assert!(!snapshot.play_pending);
}

#[test]
fn test_source_pause_is_mirrored() {
    let controller = controller();
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();
    controller.toggle_play().unwrap();

    // Media keys paused the platform player.
    source.paused.store(true, Ordering::SeqCst);
    source.emit(MediaEvent::Paused);

    assert!(!controller.snapshot().is_playing);
    assert!(controller.toggle_play().unwrap());
}

#[test]
fn test_every_transition_publishes_state_changed() {
    let controller = controller();
    let source = ScriptedSource::new();
    let mut stream = EventStream::new(controller.events().subscribe());
    controller.attach(source.clone()).unwrap();

    source.load(125.0);
    controller.toggle_play().unwrap();
    source.emit(MediaEvent::TimeUpdate { current_time: 3.0 });
    controller.seek(30.0).unwrap();
    controller.set_volume(0.5).unwrap();
    controller.set_playback_rate(PlaybackRate::Double).unwrap();
    source.finish();

    let events = drain(&mut stream);
    assert_eq!(
        events.first(),
        Some(&PlaybackEvent::Attached {
            resource_id: RESOURCE.to_string()
        })
    );
    assert_eq!(
        reasons(&events),
        vec![
            ChangeReason::ResourceReady,
            ChangeReason::PlayToggled,
            ChangeReason::Progress,
            ChangeReason::Seeked,
            ChangeReason::VolumeChanged,
            ChangeReason::RateChanged,
            ChangeReason::PausedBySource,
            ChangeReason::Ended,
        ]
    );
}

#[test]
fn test_dispatch_routes_intents() {
    let controller = controller();
    let source = ScriptedSource::new();
    controller.attach(source.clone()).unwrap();

    controller.dispatch(Intent::TogglePlay).unwrap();
    controller.dispatch(Intent::Seek(12.0)).unwrap();
    controller.dispatch(Intent::SetVolume(0.25)).unwrap();
    controller
        .dispatch(Intent::SetPlaybackRate(PlaybackRate::Half))
        .unwrap();

    let snapshot = controller.snapshot();
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.current_time, 12.0);
    assert_eq!(snapshot.volume, 0.25);
    assert_eq!(snapshot.playback_rate, PlaybackRate::Half);
}

// ============================================================================
// Binding lifecycle
// ============================================================================

#[test]
fn test_attach_subscribes_every_signal() {
    let controller = controller();
    let source = ScriptedSource::new();

    controller.attach(source.clone()).unwrap();

    assert!(controller.is_attached());
    assert_eq!(source.listener_count(), MediaSignal::ALL.len());
    for signal in MediaSignal::ALL {
        assert_eq!(source.listeners.count_for(signal), 1);
    }
}

#[test]
fn test_attach_pushes_stored_settings_and_known_duration() {
    let controller = controller();
    controller.set_volume(0.3).unwrap();
    controller.set_playback_rate_value(1.5).unwrap();

    let source = ScriptedSource::new();
    *source.duration.lock() = Some(90.0);
    controller.attach(source.clone()).unwrap();

    assert_eq!(
        source.commands(),
        vec![Command::Volume(0.3), Command::Rate(1.5)]
    );
    assert_eq!(controller.snapshot().duration, 90.0);
    assert!(controller.snapshot().is_ready());
}

#[test]
fn test_attach_failure_releases_partial_subscriptions() {
    let controller = controller();
    let source = ScriptedSource::new();
    *source.subscribe_budget.lock() = Some(3);

    let result = controller.attach(source.clone());

    assert!(matches!(
        result,
        Err(PlaybackError::Bridge(BridgeError::NotAvailable(_)))
    ));
    assert_eq!(source.subscribe_calls.load(Ordering::SeqCst), 4);
    assert_eq!(source.listener_count(), 0);
    assert!(!controller.is_attached());
}

#[test]
fn test_attach_rejects_other_resource() {
    let controller = controller();
    let other = ScriptedSource::for_resource("/2.mp3");

    let result = controller.attach(other.clone());

    assert!(matches!(result, Err(PlaybackError::ResourceMismatch { .. })));
    assert_eq!(other.listener_count(), 0);
}

#[test]
fn test_detach_stops_event_delivery() {
    let controller = controller();
    let source = ScriptedSource::new();
    source.leaky.store(true, Ordering::SeqCst);
    controller.attach(source.clone()).unwrap();
    source.load(125.0);

    assert!(controller.detach());
    assert_eq!(source.listener_count(), 0);

    // The platform still calls the stale listeners.
    source.emit(MediaEvent::TimeUpdate { current_time: 50.0 });
    source.emit(MediaEvent::Playing);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.current_time, 0.0);
    assert!(!snapshot.is_playing);
    assert!(!controller.detach());
}

#[test]
fn test_reattach_swaps_sources() {
    let controller = controller();
    let first = ScriptedSource::new();
    first.leaky.store(true, Ordering::SeqCst);
    let second = ScriptedSource::new();

    controller.attach(first.clone()).unwrap();
    controller.attach(second.clone()).unwrap();

    assert_eq!(first.listener_count(), 0);
    assert_eq!(second.listener_count(), MediaSignal::ALL.len());

    first.emit(MediaEvent::TimeUpdate { current_time: 99.0 });
    assert_eq!(controller.snapshot().current_time, 0.0);

    second.emit(MediaEvent::TimeUpdate { current_time: 5.0 });
    assert_eq!(controller.snapshot().current_time, 5.0);
}

#[test]
fn test_drop_releases_listeners_and_closes() {
    let controller = controller();
    let source = ScriptedSource::new();
    source.leaky.store(true, Ordering::SeqCst);
    let mut stream = EventStream::new(controller.events().subscribe());
    controller.attach(source.clone()).unwrap();

    drop(controller);

    assert_eq!(source.listener_count(), 0);
    // Stale listeners hold only a weak reference.
    source.emit(MediaEvent::Ended);

    let events = drain(&mut stream);
    assert_eq!(
        events.last(),
        Some(&PlaybackEvent::Closed {
            resource_id: RESOURCE.to_string()
        })
    );
}

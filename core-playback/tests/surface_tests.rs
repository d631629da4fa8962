//! SurfaceDriver tests: renders follow controller state changes.

use bridge_desktop::HeadlessMediaSource;
use core_playback::surface::ToggleIcon;
use core_playback::{ControlSurface, ControlView, PlaybackController, SurfaceDriver};
use core_runtime::PlayerConfig;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Surface that forwards every rendered view to the test.
struct ChannelSurface {
    views: mpsc::UnboundedSender<ControlView>,
}

fn surface() -> (Arc<ChannelSurface>, mpsc::UnboundedReceiver<ControlView>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(ChannelSurface { views: tx }), rx)
}

impl ControlSurface for ChannelSurface {
    fn render(&self, view: &ControlView) {
        self.views.send(view.clone()).ok();
    }
}

fn controller(buffer: usize) -> Arc<PlaybackController> {
    let config = PlayerConfig::builder()
        .resource_id("/1.mp3")
        .title("Morning Walk")
        .event_buffer_size(buffer)
        .build()
        .unwrap();
    Arc::new(PlaybackController::from_config(config).unwrap())
}

#[tokio::test]
async fn test_driver_follows_state_changes() {
    let controller = controller(32);
    let (surface, mut views) = surface();
    let driver = tokio::spawn(SurfaceDriver::new(&controller, surface).run());

    let initial = views.recv().await.unwrap();
    assert_eq!(initial.title, "Morning Walk");
    assert_eq!(initial.toggle.label, "Play");
    assert_eq!(initial.seek.max, 100.0);

    let source = Arc::new(HeadlessMediaSource::new("/1.mp3", 125.0));
    controller.attach(source.clone()).unwrap();
    source.load();

    let ready = views.recv().await.unwrap();
    assert_eq!(ready.seek.max, 125.0);
    assert_eq!(ready.total, "2:05");

    controller.toggle_play().unwrap();
    let playing = views.recv().await.unwrap();
    assert_eq!(playing.toggle.icon, ToggleIcon::Pause);

    // Seek publishes twice: once optimistically, once from the source report.
    let intent = playing.seek_intent(300.0);
    controller.dispatch(intent).unwrap();
    views.recv().await.unwrap();
    let seeked = views.recv().await.unwrap();
    assert_eq!(seeked.elapsed, "2:05");

    drop(controller);
    driver.await.unwrap();
}

#[tokio::test]
async fn test_lagged_driver_renders_latest_snapshot() {
    let controller = controller(2);
    let (surface, mut views) = surface();
    let driver = SurfaceDriver::new(&controller, surface);

    controller.on_resource_ready(125.0, 0.0);
    for second in 1..=10 {
        controller.on_progress(f64::from(second));
    }

    let handle = tokio::spawn(driver.run());
    let initial = views.recv().await.unwrap();
    assert_eq!(initial.elapsed, "0:10");

    let after_lag = views.recv().await.unwrap();
    assert_eq!(after_lag.elapsed, "0:10");

    drop(controller);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_driver_stops_without_controller() {
    let controller = controller(8);
    let (surface, mut views) = surface();
    let driver = SurfaceDriver::new(&controller, surface);

    drop(controller);
    driver.run().await;

    assert!(views.recv().await.is_none());
}

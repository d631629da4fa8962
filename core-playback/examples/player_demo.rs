//! # Terminal Player Demo
//!
//! Plays a simulated two-minute track on the headless media source and
//! renders the controls as a single status line.
//!
//! Run with: `cargo run --example player_demo --package core-playback`

use bridge_desktop::{HeadlessConfig, HeadlessMediaSource};
use bridge_traits::LogLevel;
use core_playback::{
    ControlSurface, ControlView, Intent, PlaybackController, PlaybackRate, SurfaceDriver,
};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::PlayerConfig;
use std::sync::Arc;
use std::time::Duration;

struct StatusLine;

impl ControlSurface for StatusLine {
    fn render(&self, view: &ControlView) {
        let menu = view
            .rate
            .options
            .iter()
            .map(|option| {
                if option.selected {
                    format!("[{}]", option.label)
                } else {
                    option.label.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        println!(
            "{:<10} {:>5} / {:<5} | {} | vol {:>3.0}% | {}",
            view.toggle.label,
            view.elapsed,
            view.total,
            menu,
            view.volume.value * 100.0,
            view.title,
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )?;

    let config = PlayerConfig::builder()
        .resource_id("/audio/demo-track.mp3")
        .title("Demo Track")
        .build()?;
    let controller = Arc::new(PlaybackController::from_config(config)?);

    let source = Arc::new(HeadlessMediaSource::with_config(
        "/audio/demo-track.mp3",
        HeadlessConfig::new(120.0).with_tick_interval(Duration::from_millis(100)),
    ));
    controller.attach(source.clone())?;

    let driver = tokio::spawn(SurfaceDriver::new(&controller, Arc::new(StatusLine)).run());
    let clock = source.spawn_clock();
    source.load();

    controller.dispatch(Intent::TogglePlay)?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    controller.dispatch(Intent::SetPlaybackRate(PlaybackRate::Double))?;
    controller.dispatch(Intent::SetVolume(0.6))?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    controller.dispatch(Intent::Seek(118.0))?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    clock.abort();
    drop(controller);
    driver.await?;
    Ok(())
}

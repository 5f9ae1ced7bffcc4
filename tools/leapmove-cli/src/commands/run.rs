//! Run a tracking session against the demo scene.
//!
//! This is the scheduler shell: it owns the frame source through a
//! `TrackingSession`, ticks it on a timer, and stops once the source is dead.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tokio::time::MissedTickBehavior;

use leapmove_common::config::TrackingConfig;
use leapmove_frame_source::backends::{detect_best_driver, StubDriver};
use leapmove_frame_source::{FrameSource, SensorDriver, SourceStats};
use leapmove_motion_core::session::SessionStats;
use leapmove_motion_core::strategy::build_strategy;
use leapmove_motion_core::{TickOutcome, TrackingSession};
use leapmove_scene_model::frame::parse_frames;
use leapmove_scene_model::math::{Quaternion, Vec3};
use leapmove_scene_model::scene::{CameraView, Scene, SceneHost, SceneObject};

#[derive(Serialize)]
struct RunReport<'a> {
    driver: &'a str,
    strategy: &'a str,
    session: SessionStats,
    source: SourceStats,
    objects: &'a [SceneObject],
}

/// Default scene: a selected cube at the origin, an unselected lamp, and a
/// camera ten units up the Z axis looking back at the origin.
pub fn demo_scene() -> Scene {
    let mut scene = Scene::new();
    scene.add_object(SceneObject::new("Cube", Vec3::ZERO));
    scene.add_object(SceneObject::new("Lamp", Vec3::new(4.0, 1.0, 6.0)));
    scene.select("Cube");
    scene.add_view(CameraView::new(
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::ZERO,
        Quaternion::IDENTITY,
    ));
    scene
}

fn driver_for(
    tracking: &TrackingConfig,
    frames: Option<PathBuf>,
) -> anyhow::Result<Box<dyn SensorDriver>> {
    let Some(path) = frames else {
        return Ok(detect_best_driver(tracking));
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read frames from {}", path.display()))?;
    let frames = parse_frames(&content)
        .with_context(|| format!("Failed to parse frames in {}", path.display()))?;
    println!("Replaying {} recorded frames", frames.len());
    Ok(Box::new(StubDriver::from_frames(frames)))
}

/// Tick `session` on a timer until it dies. The source is shut down once
/// `ticks` ticks have completed or on Ctrl+C.
async fn drive(
    session: &mut TrackingSession,
    scene: &mut Scene,
    tick_interval: Duration,
    ticks: Option<u64>,
    print_moves: bool,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut completed = 0u64;
    loop {
        if ticks.is_some_and(|limit| completed >= limit) {
            session.shutdown();
        }

        tokio::select! {
            _ = interval.tick(), if !session.is_dead() => {}
            result = &mut ctrl_c, if !session.is_dead() => {
                result?;
                tracing::info!("Interrupted, shutting down sensor");
                session.shutdown();
            }
            else => {}
        }

        match session.tick(&mut *scene) {
            TickOutcome::Cancelled => break,
            TickOutcome::Processed { frames, applied } => {
                completed += 1;
                if applied > 0 && print_moves {
                    for object in scene.selection() {
                        let Vec3 { x, y, z } = object.location;
                        println!(
                            "  tick {completed:>5}: {} -> ({x:.3}, {y:.3}, {z:.3}) [{frames} frames]",
                            object.name
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

pub async fn run(
    tracking: TrackingConfig,
    ticks: Option<u64>,
    frames: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    tracking.validate()?;

    let mut driver = driver_for(&tracking, frames)?;
    let driver_name = driver.name().to_string();
    let source = FrameSource::start(driver.as_mut(), tracking.buffer_capacity)
        .context("Failed to start frame source")?;

    let strategy = build_strategy(tracking.strategy, tracking.move_scale);
    let mut session = TrackingSession::new(source, strategy);
    let mut scene = demo_scene();

    if !json {
        println!("Tracking with {driver_name} sensor ({})", session.strategy_name());
        println!("  Tick interval: {}ms", tracking.tick_interval_ms);
        match ticks {
            Some(limit) => println!("  Stopping after {limit} ticks"),
            None => println!("  Press Ctrl+C to stop..."),
        }
        println!();
    }

    drive(
        &mut session,
        &mut scene,
        Duration::from_millis(tracking.tick_interval_ms),
        ticks,
        !json,
    )
    .await?;

    let report = RunReport {
        driver: &driver_name,
        strategy: session.strategy_name(),
        session: session.stats(),
        source: session.source_stats(),
        objects: &scene.objects,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("Session finished after {} ticks", report.session.ticks);
        println!(
            "  Frames: {} ({} applied, {} skipped)",
            report.session.frames, report.session.applied, report.session.skipped
        );
        println!(
            "  Sensor events: {} received, {} dropped",
            report.source.events_received, report.source.events_dropped
        );
        for object in report.objects {
            let Vec3 { x, y, z } = object.location;
            println!("  {}: ({x:.3}, {y:.3}, {z:.3})", object.name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leapmove_motion_core::ObjectMove;
    use leapmove_scene_model::frame::{BoundingVolume, Frame};

    #[test]
    fn demo_scene_selects_only_the_cube() {
        let mut scene = demo_scene();
        let names: Vec<String> = scene.selection().iter().map(|o| o.name.clone()).collect();
        assert_eq!(names, vec!["Cube".to_string()]);
        assert_eq!(scene.camera_views().len(), 1);
    }

    #[tokio::test]
    async fn replaying_a_recording_moves_the_cube() {
        let dir = std::env::temp_dir().join("leapmove_test_replay");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frames.jsonl");
        std::fs::write(
            &path,
            r#"{"id":1,"hands":[{"fingers":[{"position":{"x":0.0,"y":0.0,"z":100.0}}]}],"bounds":{"center":{"x":0.0,"y":0.0,"z":0.0},"size":{"x":200.0,"y":200.0,"z":200.0}}}"#,
        )
        .unwrap();

        let tracking = TrackingConfig {
            tick_interval_ms: 1,
            ..TrackingConfig::default()
        };
        run(tracking, Some(2), Some(path), true).await.unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }

    fn replay_session() -> TrackingSession {
        let frame = Frame::single_finger(
            1,
            Vec3::new(0.0, 0.0, 100.0),
            BoundingVolume::new(Vec3::ZERO, Vec3::new(200.0, 200.0, 200.0)),
        );
        let mut driver = StubDriver::from_frames(vec![frame]);
        let source = FrameSource::start(&mut driver, 16).unwrap();
        TrackingSession::new(source, Box::new(ObjectMove::default()))
    }

    #[tokio::test]
    async fn tick_limit_is_honoured() {
        let mut session = replay_session();
        let mut scene = demo_scene();

        drive(&mut session, &mut scene, Duration::from_millis(1), Some(1), false)
            .await
            .unwrap();

        assert!(session.is_dead());
        assert_eq!(session.stats().ticks, 1);
        assert_eq!(scene.object("Cube").unwrap().location, Vec3::new(0.0, 0.0, -5.0));
    }

    #[tokio::test]
    async fn zero_tick_limit_never_ticks() {
        let mut session = replay_session();
        let mut scene = demo_scene();

        drive(&mut session, &mut scene, Duration::from_millis(1), Some(0), false)
            .await
            .unwrap();

        assert!(session.is_dead());
        assert_eq!(session.stats().ticks, 0);
        assert_eq!(session.source_stats().polls, 0);
        assert_eq!(scene.object("Cube").unwrap().location, Vec3::ZERO);
    }

    #[tokio::test]
    async fn missing_recording_is_reported() {
        let err = run(
            TrackingConfig::default(),
            Some(1),
            Some(PathBuf::from("/nonexistent/frames.jsonl")),
            true,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read frames"));
    }
}

//! Tick driver binding a frame source to a strategy.
//!
//! The host scheduler owns the timer and calls [`TrackingSession::tick`]
//! once per interval. Once the source is dead every tick reports
//! [`TickOutcome::Cancelled`] without polling, and the scheduler should
//! remove its timer.

use serde::Serialize;

use leapmove_frame_source::{FrameSource, SourceStats};
use leapmove_scene_model::scene::SceneHost;

use crate::strategy::{FrameOutcome, InteractionStrategy};

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The source is dead; stop ticking.
    Cancelled,
    /// Frames drained this tick and how many of them moved the scene.
    Processed { frames: usize, applied: usize },
}

/// Running totals for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub ticks: u64,
    pub frames: u64,
    pub applied: u64,
    pub skipped: u64,
}

/// Owns the frame source and the active strategy.
pub struct TrackingSession {
    source: FrameSource,
    strategy: Box<dyn InteractionStrategy>,
    stats: SessionStats,
    last_outcome: Option<FrameOutcome>,
}

impl TrackingSession {
    pub fn new(source: FrameSource, strategy: Box<dyn InteractionStrategy>) -> Self {
        tracing::info!(
            driver = %source.driver_name(),
            strategy = strategy.name(),
            "Tracking session created"
        );
        Self {
            source,
            strategy,
            stats: SessionStats::default(),
            last_outcome: None,
        }
    }

    /// Drain buffered frames into the strategy.
    pub fn tick(&mut self, host: &mut dyn SceneHost) -> TickOutcome {
        if self.source.is_dead() {
            return TickOutcome::Cancelled;
        }

        self.stats.ticks += 1;
        let mut frames = 0;
        let mut applied = 0;

        for frame in self.source.poll() {
            frames += 1;
            let outcome = self.strategy.on_frame(&frame, host);
            if outcome.is_applied() {
                applied += 1;
            }
            self.last_outcome = Some(outcome);
        }

        self.stats.frames += frames as u64;
        self.stats.applied += applied as u64;
        self.stats.skipped += (frames - applied) as u64;

        if frames > 0 {
            tracing::debug!(frames, applied, "Tick processed");
        }
        TickOutcome::Processed { frames, applied }
    }

    /// Swap the active strategy.
    pub fn set_strategy(&mut self, strategy: Box<dyn InteractionStrategy>) {
        tracing::info!(
            from = self.strategy.name(),
            to = strategy.name(),
            "Switching interaction strategy"
        );
        self.strategy = strategy;
    }

    /// Shut the frame source down. Subsequent ticks are cancelled.
    pub fn shutdown(&mut self) {
        if !self.source.is_dead() {
            self.source.shutdown();
        }
    }

    pub fn is_dead(&self) -> bool {
        self.source.is_dead()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn source_stats(&self) -> SourceStats {
        self.source.stats()
    }

    /// Outcome of the most recent frame, if any frame arrived yet.
    pub fn last_outcome(&self) -> Option<FrameOutcome> {
        self.last_outcome
    }
}

impl std::fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingSession")
            .field("source", &self.source)
            .field("strategy", &self.strategy.name())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use leapmove_frame_source::backends::StubDriver;
    use leapmove_scene_model::frame::{BoundingVolume, Frame, SensorEvent};
    use leapmove_scene_model::math::{Quaternion, Vec3};
    use leapmove_scene_model::scene::{CameraView, Scene, SceneObject};

    use super::*;
    use crate::strategy::{Idle, ObjectMove};

    /// Counts calls without touching the scene.
    struct Counting(Arc<AtomicUsize>);

    impl InteractionStrategy for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn on_frame(&mut self, frame: &Frame, host: &mut dyn SceneHost) -> FrameOutcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            Idle.on_frame(frame, host)
        }
    }

    fn frame(id: u64, z: f64) -> SensorEvent {
        SensorEvent::Frame(Frame::single_finger(
            id,
            Vec3::new(0.0, 0.0, z),
            BoundingVolume::new(Vec3::ZERO, Vec3::new(200.0, 200.0, 200.0)),
        ))
    }

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new("Cube", Vec3::ZERO));
        scene.select("Cube");
        scene.add_view(CameraView::new(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Quaternion::IDENTITY,
        ));
        scene
    }

    #[test]
    fn test_tick_applies_latest_frame() {
        let mut driver = StubDriver::new(vec![frame(1, 100.0), frame(2, 0.0)]);
        let source = FrameSource::start(&mut driver, 16).unwrap();
        let mut session = TrackingSession::new(source, Box::new(ObjectMove::default()));
        let mut scene = scene();

        let outcome = session.tick(&mut scene);

        assert_eq!(outcome, TickOutcome::Processed { frames: 2, applied: 2 });
        // Last frame: z_norm = 0 → input z = 1 → offset (0, 0, -10)
        assert_eq!(scene.object("Cube").unwrap().location, Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(session.stats().applied, 2);
    }

    #[test]
    fn test_empty_tick_is_processed() {
        let mut driver = StubDriver::empty();
        let source = FrameSource::start(&mut driver, 16).unwrap();
        let mut session = TrackingSession::new(source, Box::new(Idle));
        let mut scene = scene();

        assert_eq!(
            session.tick(&mut scene),
            TickOutcome::Processed { frames: 0, applied: 0 }
        );
        assert!(session.last_outcome().is_none());
    }

    #[test]
    fn test_dead_source_is_never_polled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut driver = StubDriver::new(vec![frame(1, 100.0)]);
        let handle = driver.handle();
        let source = FrameSource::start(&mut driver, 16).unwrap();
        let mut session = TrackingSession::new(source, Box::new(Counting(Arc::clone(&calls))));
        let mut scene = scene();

        session.tick(&mut scene);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let polls_before = session.source_stats().polls;

        session.shutdown();
        assert!(session.is_dead());
        handle.push(frame(2, 100.0));

        for _ in 0..3 {
            assert_eq!(session.tick(&mut scene), TickOutcome::Cancelled);
        }
        assert_eq!(session.source_stats().polls, polls_before);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.stats().ticks, 1);
    }

    #[test]
    fn test_strategy_swap_takes_effect_next_tick() {
        let mut driver = StubDriver::empty();
        let handle = driver.handle();
        let source = FrameSource::start(&mut driver, 16).unwrap();
        let mut session = TrackingSession::new(source, Box::new(Idle));
        let mut scene = scene();

        handle.push(frame(1, 100.0));
        assert_eq!(
            session.tick(&mut scene),
            TickOutcome::Processed { frames: 1, applied: 0 }
        );
        assert_eq!(scene.object("Cube").unwrap().location, Vec3::ZERO);

        session.set_strategy(Box::new(ObjectMove::default()));
        assert_eq!(session.strategy_name(), "object_move");
        handle.push(frame(2, 100.0));
        session.tick(&mut scene);
        assert_eq!(scene.object("Cube").unwrap().location, Vec3::new(0.0, 0.0, -5.0));
    }
}

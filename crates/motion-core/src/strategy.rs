//! Interaction strategies: per-frame policies that move the host selection.
//!
//! New interaction modes implement [`InteractionStrategy`] without touching
//! the frame source or the mapper.

use serde::Serialize;

use leapmove_common::config::StrategyKind;
use leapmove_scene_model::frame::Frame;
use leapmove_scene_model::math::Vec3;
use leapmove_scene_model::scene::SceneHost;

use crate::mapper;

/// Sensor millimetres per scene unit for [`SensorSpaceMove`].
pub const SENSOR_SPACE_DIVISOR: f64 = 50.0;

/// Why a frame left the scene untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The strategy does not react to frames.
    Unhandled,
    /// Not exactly one hand with exactly one finger.
    HandCount,
    /// The host has no camera view.
    NoViewport,
    /// Nothing is selected.
    EmptySelection,
}

/// Result of feeding one frame to a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FrameOutcome {
    /// `location` was written to `targets` objects.
    Applied { location: Vec3, targets: usize },
    Skipped { reason: SkipReason },
}

impl FrameOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// A policy consuming one frame at a time.
pub trait InteractionStrategy: Send {
    /// Strategy name for logging.
    fn name(&self) -> &'static str;

    /// React to a frame. The default ignores it.
    fn on_frame(&mut self, _frame: &Frame, _host: &mut dyn SceneHost) -> FrameOutcome {
        FrameOutcome::skipped(SkipReason::Unhandled)
    }
}

/// Overwrite the location of every selected object.
fn apply_location(host: &mut dyn SceneHost, location: Vec3) -> FrameOutcome {
    let targets = host.selection();
    if targets.is_empty() {
        return FrameOutcome::skipped(SkipReason::EmptySelection);
    }
    let count = targets.len();
    for target in targets {
        target.location = location;
    }
    FrameOutcome::Applied {
        location,
        targets: count,
    }
}

/// Moves the selection along the first camera's axes, driven by a single
/// pointing finger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectMove {
    scale: f64,
}

impl ObjectMove {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }
}

impl Default for ObjectMove {
    fn default() -> Self {
        Self::new(mapper::MOVE_SCALE)
    }
}

impl InteractionStrategy for ObjectMove {
    fn name(&self) -> &'static str {
        "object_move"
    }

    fn on_frame(&mut self, frame: &Frame, host: &mut dyn SceneHost) -> FrameOutcome {
        let Some(finger) = frame.sole_finger() else {
            tracing::trace!(
                frame = frame.id,
                hands = frame.hands.len(),
                fingers = frame.finger_count(),
                "Skipping frame: need one hand with one finger"
            );
            return FrameOutcome::skipped(SkipReason::HandCount);
        };

        let input = mapper::normalized_input(frame, std::slice::from_ref(finger));

        let Some(view) = host.camera_views().into_iter().next() else {
            tracing::trace!(frame = frame.id, "Skipping frame: no camera view");
            return FrameOutcome::skipped(SkipReason::NoViewport);
        };

        let basis = mapper::basis_for(&view);
        let offset = mapper::camera_offset(input, &basis, self.scale);
        apply_location(host, offset)
    }
}

/// Moves the selection by the raw fingertip offset from the tracking
/// volume centre, ignoring the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSpaceMove {
    divisor: f64,
}

impl SensorSpaceMove {
    pub fn new(divisor: f64) -> Self {
        Self { divisor }
    }
}

impl Default for SensorSpaceMove {
    fn default() -> Self {
        Self::new(SENSOR_SPACE_DIVISOR)
    }
}

impl InteractionStrategy for SensorSpaceMove {
    fn name(&self) -> &'static str {
        "sensor_space_move"
    }

    fn on_frame(&mut self, frame: &Frame, host: &mut dyn SceneHost) -> FrameOutcome {
        let Some(finger) = frame.sole_finger() else {
            return FrameOutcome::skipped(SkipReason::HandCount);
        };
        let divisor = if self.divisor.abs() < mapper::EPSILON {
            mapper::EPSILON
        } else {
            self.divisor
        };
        let location = (finger.position - frame.bounds.center) / divisor;
        apply_location(host, location)
    }
}

/// Consumes frames without reacting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl InteractionStrategy for Idle {
    fn name(&self) -> &'static str {
        "idle"
    }
}

/// Build the strategy selected by configuration.
pub fn build_strategy(kind: StrategyKind, move_scale: f64) -> Box<dyn InteractionStrategy> {
    match kind {
        StrategyKind::ObjectMove => Box::new(ObjectMove::new(move_scale)),
        StrategyKind::SensorSpaceMove => Box::new(SensorSpaceMove::default()),
        StrategyKind::Idle => Box::new(Idle),
    }
}

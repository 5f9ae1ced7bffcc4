//! Sensor frame types.
//!
//! A [`Frame`] is one snapshot from the hand-tracking device. Frames can be
//! recorded as JSONL (one frame per line) for scripted playback.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Sensor timestamp in microseconds.
pub type TimestampUs = u64;

/// The cuboid in which the sensor currently tracks reliably.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    /// Centre of the volume (sensor space, mm).
    pub center: Vec3,
    /// Extent along each axis (mm). Expected to be non-zero.
    pub size: Vec3,
}

impl BoundingVolume {
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// Whether `point` lies inside the volume.
    pub fn contains(&self, point: &Vec3) -> bool {
        let half = self.size * 0.5;
        (point.x - self.center.x).abs() <= half.x.abs()
            && (point.y - self.center.y).abs() <= half.y.abs()
            && (point.z - self.center.z).abs() <= half.z.abs()
    }
}

impl Default for BoundingVolume {
    /// Typical interaction box of a desktop hand-tracking controller.
    fn default() -> Self {
        Self {
            center: Vec3::new(0.0, 200.0, 0.0),
            size: Vec3::new(235.0, 235.0, 147.0),
        }
    }
}

/// A single tracked finger tip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Finger {
    #[serde(default)]
    pub id: i32,
    /// Tip position in sensor space (mm).
    pub position: Vec3,
}

impl Finger {
    pub fn new(id: i32, position: Vec3) -> Self {
        Self { id, position }
    }
}

/// A tracked hand and its visible fingers, in sensor order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hand {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub fingers: Vec<Finger>,
}

impl Hand {
    pub fn new(id: i32, fingers: Vec<Finger>) -> Self {
        Self { id, fingers }
    }
}

/// One sensor snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonically increasing frame id assigned by the sensor.
    #[serde(default)]
    pub id: u64,

    /// Sensor timestamp.
    #[serde(rename = "t", default)]
    pub timestamp_us: TimestampUs,

    /// Hands in sensor order.
    #[serde(default)]
    pub hands: Vec<Hand>,

    /// Tracking volume at the time of this frame.
    #[serde(default)]
    pub bounds: BoundingVolume,
}

impl Frame {
    pub fn new(id: u64, timestamp_us: TimestampUs, hands: Vec<Hand>, bounds: BoundingVolume) -> Self {
        Self {
            id,
            timestamp_us,
            hands,
            bounds,
        }
    }

    /// Frame with a single hand holding out a single finger at `position`.
    pub fn single_finger(id: u64, position: Vec3, bounds: BoundingVolume) -> Self {
        Self::new(
            id,
            0,
            vec![Hand::new(0, vec![Finger::new(0, position)])],
            bounds,
        )
    }

    /// The finger when exactly one hand with exactly one finger is visible.
    pub fn sole_finger(&self) -> Option<&Finger> {
        match self.hands.as_slice() {
            [hand] => match hand.fingers.as_slice() {
                [finger] => Some(finger),
                _ => None,
            },
            _ => None,
        }
    }

    /// Total number of fingers across all hands.
    pub fn finger_count(&self) -> usize {
        self.hands.iter().map(|h| h.fingers.len()).sum()
    }
}

/// Events delivered by the sensor driver to a listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorEvent {
    /// The listener was attached to a connection.
    Init,
    /// The device became available.
    Connect,
    /// The listener is being detached; nothing follows.
    Exit,
    /// A new tracking frame is ready.
    Frame(Frame),
}

impl SensorEvent {
    /// Consume the event, returning its frame if it carries one.
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            SensorEvent::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SensorEvent::Init => "init",
            SensorEvent::Connect => "connect",
            SensorEvent::Exit => "exit",
            SensorEvent::Frame(_) => "frame",
        }
    }
}

/// Parse frames from JSONL content (one JSON object per line).
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_frames(jsonl: &str) -> Result<Vec<Frame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> BoundingVolume {
        BoundingVolume::new(Vec3::ZERO, Vec3::new(200.0, 200.0, 200.0))
    }

    #[test]
    fn test_sole_finger_requires_one_hand_one_finger() {
        let single = Frame::single_finger(1, Vec3::new(1.0, 2.0, 3.0), bounds());
        assert_eq!(single.sole_finger().unwrap().position, Vec3::new(1.0, 2.0, 3.0));

        let two_fingers = Frame::new(
            2,
            0,
            vec![Hand::new(
                0,
                vec![Finger::new(0, Vec3::ZERO), Finger::new(1, Vec3::ZERO)],
            )],
            bounds(),
        );
        assert!(two_fingers.sole_finger().is_none());
        assert_eq!(two_fingers.finger_count(), 2);

        let two_hands = Frame::new(
            3,
            0,
            vec![
                Hand::new(0, vec![Finger::new(0, Vec3::ZERO)]),
                Hand::new(1, vec![Finger::new(1, Vec3::ZERO)]),
            ],
            bounds(),
        );
        assert!(two_hands.sole_finger().is_none());

        let empty = Frame::new(4, 0, vec![], bounds());
        assert!(empty.sole_finger().is_none());
    }

    #[test]
    fn test_bounds_contains() {
        let b = bounds();
        assert!(b.contains(&Vec3::new(99.0, -99.0, 0.0)));
        assert!(!b.contains(&Vec3::new(101.0, 0.0, 0.0)));
    }

    #[test]
    fn test_sensor_event_tagging() {
        let json = serde_json::to_string(&SensorEvent::Connect).unwrap();
        assert_eq!(json, r#"{"type":"connect"}"#);
        assert!(SensorEvent::Exit.into_frame().is_none());
    }

    #[test]
    fn test_parse_frames_skips_comments() {
        let jsonl = r#"
# recorded with a simulated sensor
{"id":1,"t":1000,"hands":[{"fingers":[{"position":{"x":0.0,"y":0.0,"z":100.0}}]}],"bounds":{"center":{"x":0.0,"y":0.0,"z":0.0},"size":{"x":200.0,"y":200.0,"z":200.0}}}

{"id":2,"t":2000}
"#;
        let frames = parse_frames(jsonl).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestamp_us, 1000);
        assert_eq!(frames[0].sole_finger().unwrap().position.z, 100.0);
        assert!(frames[1].hands.is_empty());
        assert_eq!(frames[1].bounds, BoundingVolume::default());
    }
}

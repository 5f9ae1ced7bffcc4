//! LeapMove Scene Model
//!
//! Defines the core data contracts shared by the tracking pipeline:
//! - **Math:** `Vec3`, `Quaternion`, and row-major `Mat4`
//! - **Frame:** Sensor snapshots of hands, fingers, and the tracking volume
//! - **Scene:** Camera views and selectable objects owned by the host
//!
//! Sensor-space positions are in millimetres relative to the device;
//! scene-space values are in host world units.

pub mod frame;
pub mod math;
pub mod scene;

pub use frame::*;
pub use math::*;
pub use scene::*;

//! Camera-relative coordinate mapping.
//!
//! Stateless: every function is a pure transform of its inputs.
//!
//! Pipeline for one frame:
//! 1. [`normalized_input`] maps fingertip position into the unit tracking cube
//! 2. [`camera_position`] recovers the eye point from the view matrix
//! 3. [`unit_vectors`] builds right/up/forward from look-at and rotation
//! 4. [`add_vector`] accumulates `input · basis · scale` into an offset

use leapmove_scene_model::frame::{Finger, Frame};
use leapmove_scene_model::math::{Mat4, Quaternion, Vec3};
use leapmove_scene_model::scene::CameraView;

/// Smallest divisor used when normalizing. Degenerate lengths and volume
/// extents are replaced by this value instead of producing NaN.
pub const EPSILON: f64 = 0.01;

/// Scale applied to each basis contribution when moving objects.
pub const MOVE_SCALE: f64 = 10.0;

/// World up before camera rotation.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// World right before camera rotation.
pub const WORLD_RIGHT: Vec3 = Vec3::X;

/// Camera-relative axes for one tick: right, up, forward.
///
/// `x` and `y` come from the rotation quaternion while `z` comes from the
/// look-at direction, so the three are only orthonormal when both agree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

fn clamp_divisor(value: f64) -> f64 {
    if value.abs() < EPSILON {
        EPSILON
    } else {
        value
    }
}

/// Map the mean position of `fingers` into the frame's tracking cube.
///
/// X and Y are `(p - center) / size`; Z is flipped to `1 - (p - center) / size`
/// so a fingertip closer to the user reads larger. The result is nominally
/// within `[-1, 1]` but not clamped. With no fingers the mean is the volume
/// centre, giving `(0, 0, 1)`.
pub fn normalized_input(frame: &Frame, fingers: &[Finger]) -> Vec3 {
    let bounds = &frame.bounds;
    let mean = if fingers.is_empty() {
        bounds.center
    } else {
        let sum = fingers
            .iter()
            .fold(Vec3::ZERO, |acc, finger| acc + finger.position);
        sum / fingers.len() as f64
    };

    let offset = mean - bounds.center;
    let x = offset.x / clamp_divisor(bounds.size.x);
    let y = offset.y / clamp_divisor(bounds.size.y);
    let z = offset.z / clamp_divisor(bounds.size.z);
    Vec3::new(x, y, 1.0 - z)
}

/// Recover the camera's world position from a rigid view matrix:
/// `-(Rᵀ · t)` with `R` the rotation block and `t` the translation column.
///
/// Matrices with scale or shear give meaningless results.
pub fn camera_position(view_matrix: &Mat4) -> Vec3 {
    let r = view_matrix.rotation_block();
    let t = view_matrix.translation().to_array();
    let column = |i: usize| r[0][i] * t[0] + r[1][i] * t[1] + r[2][i] * t[2];
    Vec3::new(-column(0), -column(1), -column(2))
}

/// Scale `v` to unit length, dividing by [`EPSILON`] when `|v|` is smaller.
pub fn unit_vector(v: Vec3) -> Vec3 {
    let length = v.length();
    let divisor = if length < EPSILON { EPSILON } else { length };
    v / divisor
}

pub fn quaternion_conjugate(q: Quaternion) -> Quaternion {
    Quaternion::new(q.w, -q.x, -q.y, -q.z)
}

/// Hamilton product `a · b`. Not commutative.
pub fn hamilton_product(a: Quaternion, b: Quaternion) -> Quaternion {
    Quaternion::new(
        a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
        a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
        a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
    )
}

/// Rotate `v` by `q` as `q · (0, v) · q*`.
///
/// `q` must be unit length; it is not renormalized here.
pub fn rotate_vector(v: Vec3, q: Quaternion) -> Vec3 {
    let rotated = hamilton_product(
        hamilton_product(q, Quaternion::pure(v)),
        quaternion_conjugate(q),
    );
    rotated.vector()
}

/// Build the camera basis.
///
/// Forward points from `camera_pos` to `look_at`; right and up are the world
/// axes rotated by `rotation`. No re-orthogonalization is applied.
pub fn unit_vectors(look_at: Vec3, camera_pos: Vec3, rotation: Quaternion) -> Basis {
    Basis {
        x: rotate_vector(WORLD_RIGHT, rotation),
        y: rotate_vector(WORLD_UP, rotation),
        z: unit_vector(look_at - camera_pos),
    }
}

/// `target += magnitude · vector · scale`, component-wise.
pub fn add_vector(target: &mut Vec3, vector: Vec3, magnitude: f64, scale: f64) {
    target.x += magnitude * vector.x * scale;
    target.y += magnitude * vector.y * scale;
    target.z += magnitude * vector.z * scale;
}

/// Basis for a host camera view.
pub fn basis_for(view: &CameraView) -> Basis {
    let eye = camera_position(&view.view_matrix);
    unit_vectors(view.look_at, eye, view.rotation)
}

/// Project normalized input onto `basis`, starting from a zero offset.
pub fn camera_offset(input: Vec3, basis: &Basis, scale: f64) -> Vec3 {
    let mut offset = Vec3::ZERO;
    add_vector(&mut offset, basis.x, input.x, scale);
    add_vector(&mut offset, basis.y, input.y, scale);
    add_vector(&mut offset, basis.z, input.z, scale);
    offset
}

//! Minimal linear-algebra value types.
//!
//! These are plain data carriers. The rotation algebra used by the motion
//! pipeline lives in `leapmove-motion-core::mapper`.

use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A 3D vector or point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const X: Vec3 = Vec3 {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };

    pub const Y: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    pub const Z: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Vec3;

    fn div(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// A rotation quaternion stored scalar-first as `(w, x, y, z)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// Identity rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Pure quaternion `(0, v)`.
    pub fn pure(v: Vec3) -> Self {
        Self::new(0.0, v.x, v.y, v.z)
    }

    /// Rotation of `angle_radians` about `axis` (normalized here).
    pub fn from_axis_angle(axis: Vec3, angle_radians: f64) -> Self {
        let len = axis.length();
        if len == 0.0 {
            return Self::IDENTITY;
        }
        let axis = axis / len;
        let half = angle_radians / 2.0;
        let s = half.sin();
        Self::new(half.cos(), axis.x * s, axis.y * s, axis.z * s)
    }

    /// The vector part `(x, y, z)`.
    pub fn vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn magnitude(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Equivalent 3x3 rotation matrix (row-major). Assumes unit length.
    pub fn to_rotation_matrix(&self) -> [[f64; 3]; 3] {
        let Quaternion { w, x, y, z } = *self;
        [
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - w * z),
                2.0 * (x * z + w * y),
            ],
            [
                2.0 * (x * y + w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - w * x),
            ],
            [
                2.0 * (x * z - w * y),
                2.0 * (y * z + w * x),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ]
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A 4x4 matrix in row-major order. Translation lives in column 3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub rows: [[f64; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Compose a rigid transform from a rotation block and a translation.
    pub fn from_rotation_translation(rotation: [[f64; 3]; 3], translation: Vec3) -> Self {
        let t = translation.to_array();
        let mut rows = Self::IDENTITY.rows;
        for (r, row) in rotation.iter().enumerate() {
            rows[r][..3].copy_from_slice(row);
            rows[r][3] = t[r];
        }
        Self { rows }
    }

    /// World-to-camera (view) matrix for a camera placed at `position`
    /// with world orientation `rotation`.
    pub fn view_from_camera(position: Vec3, rotation: Quaternion) -> Self {
        let r = rotation.to_rotation_matrix();
        let mut rt = [[0.0; 3]; 3];
        for (i, row) in rt.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = r[j][i];
            }
        }
        let p = position.to_array();
        let t = Vec3::new(
            -(rt[0][0] * p[0] + rt[0][1] * p[1] + rt[0][2] * p[2]),
            -(rt[1][0] * p[0] + rt[1][1] * p[1] + rt[1][2] * p[2]),
            -(rt[2][0] * p[0] + rt[2][1] * p[1] + rt[2][2] * p[2]),
        );
        Self::from_rotation_translation(rt, t)
    }

    /// Upper-left 3x3 block.
    pub fn rotation_block(&self) -> [[f64; 3]; 3] {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            row.copy_from_slice(&self.rows[r][..3]);
        }
        out
    }

    /// Translation column.
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.rows[0][3], self.rows[1][3], self.rows[2][3])
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_ops() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(0.5, 0.5, 0.5);
        assert_eq!(a + b, Vec3::new(1.5, 2.5, 3.5));
        assert_eq!(a - b, Vec3::new(0.5, 1.5, 2.5));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
        assert!((Vec3::new(3.0, 4.0, 0.0).length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_angle_is_unit() {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 1.2);
        assert!((q.magnitude() - 1.0).abs() < 1e-12);
        assert_eq!(Quaternion::from_axis_angle(Vec3::ZERO, 1.0), Quaternion::IDENTITY);
    }

    #[test]
    fn test_rotation_matrix_of_quarter_turn_about_z() {
        let q = Quaternion::from_axis_angle(Vec3::Z, std::f64::consts::FRAC_PI_2);
        let m = q.to_rotation_matrix();
        // X axis maps onto Y
        assert!((m[0][0]).abs() < 1e-12);
        assert!((m[1][0] - 1.0).abs() < 1e-12);
        assert!((m[2][0]).abs() < 1e-12);
    }

    #[test]
    fn test_view_from_identity_camera_is_pure_translation() {
        let view = Mat4::view_from_camera(Vec3::new(0.0, 0.0, 10.0), Quaternion::IDENTITY);
        assert_eq!(view.translation(), Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(view.rotation_block(), [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
    }
}

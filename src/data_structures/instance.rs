//! Rigid transforms for placed objects.
//!
//! Placed objects never scale, so a [`Pose`] is only a position and a unit
//! rotation. World transforms are kept as `cgmath::Matrix4<f32>` (column
//! major) and converted to the row-major layout of the scene document at the
//! persistence boundary.

use std::ops::Mul;

use cgmath::{InnerSpace, Matrix, Matrix4, One, SquareMatrix};

/// Tolerance used when checking that a matrix is a rigid transform.
pub const RIGID_EPSILON: f32 = 1e-3;

/// A rigid position and orientation in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
}

impl Pose {
    /// The identity pose (no translation, no rotation).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
        }
    }

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: cgmath::Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    /// The rotation is re-normalized so the result is always rigid, even for
    /// quaternions that drifted slightly off the unit sphere upstream.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let rotation = if self.rotation.magnitude2() > f32::EPSILON {
            self.rotation.normalize()
        } else {
            cgmath::Quaternion::one()
        };
        Matrix4::from_translation(self.position) * Matrix4::from(rotation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new()
    }
}

impl Mul<Pose> for Pose {
    type Output = Self;

    fn mul(self, rhs: Pose) -> Self::Output {
        Pose {
            position: self.position + (self.rotation * rhs.position),
            rotation: self.rotation * rhs.rotation,
        }
    }
}

impl From<cgmath::Vector3<f32>> for Pose {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Pose {
            position,
            ..Default::default()
        }
    }
}

/// Checks the rotation block is orthonormal with determinant one and the
/// bottom row is `[0, 0, 0, 1]`.
pub fn is_rigid(m: &Matrix4<f32>, epsilon: f32) -> bool {
    let all_finite = (0..4).all(|c| (0..4).all(|r| m[c][r].is_finite()));
    if !all_finite {
        return false;
    }
    let bottom_row = [m.x.w, m.y.w, m.z.w, m.w.w];
    if bottom_row
        .iter()
        .zip([0.0, 0.0, 0.0, 1.0])
        .any(|(a, b)| (a - b).abs() > epsilon)
    {
        return false;
    }
    let rotation = cgmath::Matrix3::new(
        m.x.x, m.x.y, m.x.z, m.y.x, m.y.y, m.y.z, m.z.x, m.z.y, m.z.z,
    );
    let gram = rotation.transpose() * rotation;
    let orthonormal = (0..3).all(|c| {
        (0..3).all(|r| {
            let expected = if c == r { 1.0 } else { 0.0 };
            (gram[c][r] - expected).abs() <= epsilon
        })
    });
    orthonormal && (rotation.determinant() - 1.0).abs() <= epsilon
}

/// Flattens a matrix into 16 floats, row by row.
pub fn to_row_major(m: &Matrix4<f32>) -> [f32; 16] {
    let mut out = [0.0; 16];
    for row in 0..4 {
        for col in 0..4 {
            out[row * 4 + col] = m[col][row];
        }
    }
    out
}

/// Inverse of [`to_row_major`].
pub fn from_row_major(values: &[f32; 16]) -> Matrix4<f32> {
    let rows: [[f32; 4]; 4] = [
        [values[0], values[1], values[2], values[3]],
        [values[4], values[5], values[6], values[7]],
        [values[8], values[9], values[10], values[11]],
        [values[12], values[13], values[14], values[15]],
    ];
    // `From<[[f32; 4]; 4]>` reads columns, so the rows land transposed.
    Matrix4::from(rows).transpose()
}

//! Stereo view splitting.
//!
//! Derives a left and right eye view from one monocular world-to-camera
//! matrix. Each eye is offset by half the IPD along the camera's local X axis
//! and drawn into its own half of the framebuffer.

use cgmath::{Matrix4, Vector3};

use crate::render::Viewport;

/// Default interpupillary distance in world units (metres).
pub const DEFAULT_IPD: f32 = 0.064;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    /// Signed offset along camera-local X: left is negative.
    pub fn offset(self, ipd: f32) -> f32 {
        match self {
            Eye::Left => -ipd / 2.0,
            Eye::Right => ipd / 2.0,
        }
    }

    pub fn viewport(self, width: u32, height: u32) -> Viewport {
        let half = width / 2;
        match self {
            Eye::Left => Viewport::new(0, 0, half, height),
            Eye::Right => Viewport::new(half, 0, half, height),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyeView {
    pub eye: Eye,
    pub view: Matrix4<f32>,
    pub viewport: Viewport,
}

/// Eye view matrix `T_e * V`.
///
/// The translation must be pre-multiplied: applied after `V` it moves points
/// in camera space. Post-multiplying would separate the eyes along the world
/// X axis and break parallax whenever the camera is rotated.
pub fn eye_view_matrix(view: &Matrix4<f32>, eye: Eye, ipd: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(eye.offset(ipd), 0.0, 0.0)) * view
}

/// Splits `view` into `[left, right]` for a `width` x `height` framebuffer.
pub fn split(view: &Matrix4<f32>, ipd: f32, width: u32, height: u32) -> [EyeView; 2] {
    Eye::BOTH.map(|eye| EyeView {
        eye,
        view: eye_view_matrix(view, eye, ipd),
        viewport: eye.viewport(width, height),
    })
}

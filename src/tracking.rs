//! Tracking collaborator boundary.
//!
//! Pose estimation itself lives outside the engine. The frame loop only sees
//! one [`TrackingSnapshot`] per tick and, for a pending tap, an ordered list of
//! [`HitResult`]s (nearest first).

use cgmath::Matrix4;

use crate::{data_structures::instance::Pose, error::Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingState {
    Tracking,
    Paused,
    Lost,
}

/// A screen coordinate in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Camera state for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingSnapshot {
    pub state: TrackingState,
    pub camera_pose: Pose,
    /// World-to-camera matrix.
    pub view: Matrix4<f32>,
    /// Projection for the clip planes passed to [`Tracker::update`].
    pub projection: Matrix4<f32>,
}

/// The kind of real-world feature a hit landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trackable {
    /// A detected plane; `contains_pose` is whether the hit pose lies inside
    /// the plane's measured polygon.
    Plane { contains_pose: bool },
    /// A feature point; `orientation_estimated` is whether it exposes an
    /// estimated surface normal.
    Point { orientation_estimated: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitResult {
    pub trackable: Trackable,
    pub pose: Pose,
    pub distance: f32,
}

/// Tracking session provided by the host platform.
pub trait Tracker {
    /// Establishes the session. Failing here is fatal for the engine.
    fn start(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn close(&mut self);

    fn set_display_geometry(&mut self, width: u32, height: u32);

    fn update(&mut self, near: f32, far: f32) -> Result<TrackingSnapshot>;

    /// Hits ordered nearest first.
    fn hit_test(&mut self, point: ScreenPoint) -> Vec<HitResult>;
}

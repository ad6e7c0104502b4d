//! Render dispatch.
//!
//! This module defines the [`Renderer`] seam and turns one tracking snapshot
//! into the list of passes for the current frame: a single monocular pass, or
//! two sequential eye passes produced by [`crate::stereo::split`].
//!
//! # Key types
//!
//! - [`Renderer`] is the renderer collaborator (frame begin/end plus per-pass state)
//! - [`ViewDescriptor`] contains everything one pass needs
//! - [`RenderMode`] selects monocular or stereo output
//!

use cgmath::Matrix4;

use crate::{context::Context, stereo, stereo::Eye, tracking::TrackingSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    #[default]
    Mono,
    Stereo,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::Mono => RenderMode::Stereo,
            RenderMode::Stereo => RenderMode::Mono,
        }
    }
}

/// One render pass: which eye (if any), where to draw, and with which
/// camera matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewDescriptor {
    pub eye: Option<Eye>,
    pub viewport: Viewport,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub near: f32,
    pub far: f32,
}

/// Renderer collaborator. Owns the swap chain and the renderable scene.
pub trait Renderer {
    /// Returns `false` when the frame should be skipped (e.g. the swap chain
    /// is not ready); `end_frame` is then not called.
    fn begin_frame(&mut self, frame_time_nanos: u64) -> bool;

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_projection(&mut self, projection: &Matrix4<f32>, near: f32, far: f32);

    fn set_view_matrix(&mut self, view: &Matrix4<f32>);

    fn render(&mut self, view: &ViewDescriptor);

    fn end_frame(&mut self);
}

/// Passes for this frame. Empty when there is no surface to draw into.
pub fn views_for(ctx: &Context, snapshot: &TrackingSnapshot) -> Vec<ViewDescriptor> {
    let Some(surface) = ctx.surface else {
        return Vec::new();
    };
    let (near, far) = (ctx.config.near, ctx.config.far);
    match ctx.render_mode {
        RenderMode::Mono => vec![ViewDescriptor {
            eye: None,
            viewport: Viewport::new(0, 0, surface.width, surface.height),
            view: snapshot.view,
            projection: snapshot.projection,
            near,
            far,
        }],
        RenderMode::Stereo => {
            stereo::split(&snapshot.view, ctx.config.ipd, surface.width, surface.height)
                .into_iter()
                .map(|eye_view| ViewDescriptor {
                    eye: Some(eye_view.eye),
                    viewport: eye_view.viewport,
                    view: eye_view.view,
                    projection: snapshot.projection,
                    near,
                    far,
                })
                .collect()
        }
    }
}

/// Issues `views` as sequential passes inside one frame. Returns whether the
/// frame was actually rendered.
pub fn render_frame<R: Renderer>(
    renderer: &mut R,
    views: &[ViewDescriptor],
    frame_time_nanos: u64,
) -> bool {
    if views.is_empty() {
        return false;
    }
    if !renderer.begin_frame(frame_time_nanos) {
        log::debug!("renderer skipped frame at {}ns", frame_time_nanos);
        return false;
    }
    for view in views {
        renderer.set_viewport(view.viewport);
        renderer.set_projection(&view.projection, view.near, view.far);
        renderer.set_view_matrix(&view.view);
        renderer.render(view);
    }
    renderer.end_frame();
    true
}

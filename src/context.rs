use crate::{config::EngineConfig, render::RenderMode};

/// Size of the presentation surface in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
}

/// Runtime state shared by every tick: configuration, the current surface
/// (if any) and the render mode.
///
/// Owned by the frame loop and only changed at tick boundaries.
#[derive(Clone, Debug)]
pub struct Context {
    pub config: EngineConfig,
    pub surface: Option<Surface>,
    pub render_mode: RenderMode,
}

impl Context {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            surface: None,
            render_mode: RenderMode::default(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface = Some(Surface { width, height });
        } else {
            log::warn!("ignoring degenerate surface size {}x{}", width, height);
        }
    }

    pub fn toggle_render_mode(&mut self) -> RenderMode {
        self.render_mode = self.render_mode.toggled();
        self.render_mode
    }

    pub fn is_stereo(&self) -> bool {
        self.render_mode == RenderMode::Stereo
    }
}

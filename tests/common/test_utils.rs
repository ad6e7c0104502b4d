#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use mr_ngin::{
    config::EngineConfig,
    data_structures::instance::Pose,
    error::{Result, SceneError},
    flow::FrameLoop,
    render::{Renderer, ViewDescriptor, Viewport},
    resources::ModelRepository,
    tracking::{HitResult, ScreenPoint, Trackable, Tracker, TrackingSnapshot, TrackingState},
};
use mr_ngin::cgmath::{Deg, Matrix4, SquareMatrix, perspective};

/// Tracker whose state and hit results are set by the test.
pub(crate) struct ScriptedTracker {
    pub state: TrackingState,
    pub hits: Vec<HitResult>,
    pub view: Matrix4<f32>,
    pub fail_start: bool,
    pub fail_update: bool,
    pub display_geometry: Option<(u32, u32)>,
    start_invocations: u32,
    resume_invocations: u32,
    pause_invocations: u32,
    close_invocations: u32,
    hit_test_invocations: u32,
}

impl ScriptedTracker {
    pub fn new() -> Self {
        Self {
            state: TrackingState::Tracking,
            hits: Vec::new(),
            view: Matrix4::identity(),
            fail_start: false,
            fail_update: false,
            display_geometry: None,
            start_invocations: 0,
            resume_invocations: 0,
            pause_invocations: 0,
            close_invocations: 0,
            hit_test_invocations: 0,
        }
    }

    pub fn start_invocations(&self) -> u32 {
        self.start_invocations
    }

    pub fn resume_invocations(&self) -> u32 {
        self.resume_invocations
    }

    pub fn pause_invocations(&self) -> u32 {
        self.pause_invocations
    }

    pub fn close_invocations(&self) -> u32 {
        self.close_invocations
    }

    pub fn hit_test_invocations(&self) -> u32 {
        self.hit_test_invocations
    }
}

impl Default for ScriptedTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker for ScriptedTracker {
    fn start(&mut self) -> Result<()> {
        self.start_invocations += 1;
        if self.fail_start {
            return Err(SceneError::SessionUnavailable(
                "tracking not supported".to_string(),
            ));
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.resume_invocations += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.pause_invocations += 1;
    }

    fn close(&mut self) {
        self.close_invocations += 1;
    }

    fn set_display_geometry(&mut self, width: u32, height: u32) {
        self.display_geometry = Some((width, height));
    }

    fn update(&mut self, near: f32, far: f32) -> Result<TrackingSnapshot> {
        if self.fail_update {
            return Err(SceneError::TrackingUnavailable("no camera frame".to_string()));
        }
        Ok(TrackingSnapshot {
            state: self.state,
            camera_pose: Pose::new(),
            view: self.view,
            projection: perspective(Deg(60.0), 1.0, near, far),
        })
    }

    fn hit_test(&mut self, _point: ScreenPoint) -> Vec<HitResult> {
        self.hit_test_invocations += 1;
        self.hits.clone()
    }
}

/// Renderer that records every pass it is asked to draw.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    pub skip_frames: bool,
    pub passes: Vec<ViewDescriptor>,
    pub viewports: Vec<Viewport>,
    frames_begun: u32,
    frames_ended: u32,
}

impl RecordingRenderer {
    pub fn frames_begun(&self) -> u32 {
        self.frames_begun
    }

    pub fn frames_ended(&self) -> u32 {
        self.frames_ended
    }
}

impl Renderer for RecordingRenderer {
    fn begin_frame(&mut self, _frame_time_nanos: u64) -> bool {
        self.frames_begun += 1;
        !self.skip_frames
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewports.push(viewport);
    }

    fn set_projection(&mut self, _projection: &Matrix4<f32>, _near: f32, _far: f32) {}

    fn set_view_matrix(&mut self, _view: &Matrix4<f32>) {}

    fn render(&mut self, view: &ViewDescriptor) {
        self.passes.push(*view);
    }

    fn end_frame(&mut self) {
        self.frames_ended += 1;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MemoryAsset {
    pub name: String,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MemoryInstance(pub u32);

/// Model repository keeping everything in maps. Bytes equal to
/// [`CORRUPT_MODEL`] fail to decode.
#[derive(Default)]
pub(crate) struct MemoryRepository {
    next_instance: u32,
    pub loaded: Vec<String>,
    pub destroyed: Vec<String>,
    pub released: Vec<u32>,
    pub attached: HashSet<u32>,
    pub transforms: HashMap<u32, Matrix4<f32>>,
}

pub(crate) const CORRUPT_MODEL: &[u8] = b"corrupt";

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelRepository for MemoryRepository {
    type Asset = MemoryAsset;
    type Instance = MemoryInstance;

    fn load_asset(&mut self, name: &str, bytes: &[u8]) -> Result<MemoryAsset> {
        if bytes == CORRUPT_MODEL {
            return Err(SceneError::AssetLoadFailure {
                name: name.to_string(),
                reason: "unreadable geometry".to_string(),
            });
        }
        self.loaded.push(name.to_string());
        Ok(MemoryAsset {
            name: name.to_string(),
        })
    }

    fn create_instance(&mut self, _asset: &MemoryAsset) -> Result<MemoryInstance> {
        let instance = MemoryInstance(self.next_instance);
        self.next_instance += 1;
        Ok(instance)
    }

    fn set_root_transform(&mut self, instance: &MemoryInstance, transform: &Matrix4<f32>) {
        self.transforms.insert(instance.0, *transform);
    }

    fn attach(&mut self, instance: &MemoryInstance) {
        self.attached.insert(instance.0);
    }

    fn detach(&mut self, instance: &MemoryInstance) {
        self.attached.remove(&instance.0);
    }

    fn release_instance(&mut self, instance: MemoryInstance) {
        self.transforms.remove(&instance.0);
        self.released.push(instance.0);
    }

    fn destroy_asset(&mut self, asset: MemoryAsset) {
        self.destroyed.push(asset.name);
    }
}

pub(crate) type TestLoop = FrameLoop<ScriptedTracker, RecordingRenderer, MemoryRepository>;

/// Engine rooted at `data_dir` without restore-on-start.
pub(crate) fn test_loop(data_dir: &Path) -> TestLoop {
    let mut config = EngineConfig::with_data_dir(data_dir);
    config.restore_on_start = false;
    FrameLoop::new(
        config,
        ScriptedTracker::new(),
        RecordingRenderer::default(),
        MemoryRepository::new(),
    )
    .expect("valid test configuration")
}

/// A hit on a plane, inside its polygon.
pub(crate) fn plane_hit(x: f32, y: f32, z: f32, distance: f32) -> HitResult {
    HitResult {
        trackable: Trackable::Plane {
            contains_pose: true,
        },
        pose: Pose::from_translation(x, y, z),
        distance,
    }
}

pub(crate) fn hit(trackable: Trackable, x: f32, y: f32, z: f32) -> HitResult {
    HitResult {
        trackable,
        pose: Pose::from_translation(x, y, z),
        distance: z.abs(),
    }
}

pub(crate) fn write_model(dir: &Path, name: &str, bytes: &[u8]) {
    std::fs::create_dir_all(dir).expect("create model dir");
    std::fs::write(dir.join(name), bytes).expect("write model file");
}

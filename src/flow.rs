//! Frame loop control.
//!
//! [`FrameLoop`] is the top-level state machine of the engine. It owns the
//! scene, the runtime [`Context`] and the collaborators (tracker, renderer,
//! model repository) and is driven by the host once per display refresh via
//! [`FrameLoop::tick`].
//!
//! Host input (taps, UI buttons, surface lifecycle) never calls into the scene
//! directly. It is sent as [`Event`] values into one inbound queue, and the
//! queue is drained at the start of the next tick. Toggles therefore take
//! effect at a tick boundary, never mid-tick.
//!
//! # Session states
//!
//! `NoSession -> SessionPaused <-> SessionTracking / SessionLost`
//!
//! The session is established on the first [`FrameLoop::resume`]. Afterwards
//! the state follows the tracker's snapshot every tick. Pausing stops tick
//! delivery entirely: [`FrameLoop::tick`] is a no-op until resumed.
//!
//! # Lifecycle Flow
//!
//! Each tick:
//! 1. Drain inbound events (taps are queued, controls applied)
//! 2. Apply finished I/O work (imported models, restored scenes)
//! 3. Acquire a tracking snapshot
//! 4. If tracking, resolve the oldest pending tap (at most one per tick)
//! 5. Render one monocular pass or two stereo eye passes

use std::{collections::VecDeque, fmt, path::PathBuf, sync::mpsc, time::Duration};

use instant::Instant;
use log::{debug, error, info, trace, warn};

use crate::{
    config::EngineConfig,
    context::Context,
    data_structures::scene_graph::{PlacedObjectId, SceneGraph},
    error::{ErrorKind, Result, SceneError},
    io::{Completion, IoWorker, TaskKind},
    placement::{self, Placement},
    render::{self, Renderer},
    resources::{
        ModelRepository,
        scene::{RestoreReport, SceneDocument},
    },
    tracking::{ScreenPoint, Tracker, TrackingState},
};

/// Discrete host input, consumed at the next tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Tap(ScreenPoint),
    /// Import a model file into the models directory and select it.
    LoadModel(PathBuf),
    NextModel,
    ToggleStereo,
    SaveScene,
    LoadScene,
    ClearScene,
    SurfaceCreated { width: u32, height: u32 },
    SurfaceChanged { width: u32, height: u32 },
    SurfaceDestroyed,
}

/// Producer half of the inbound event queue. Can be moved to an input thread.
#[derive(Clone, Debug)]
pub struct EventSender(mpsc::Sender<Event>);

impl EventSender {
    /// Returns `false` if the frame loop is gone.
    pub fn send(&self, event: Event) -> bool {
        self.0.send(event).is_ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    SessionPaused,
    SessionTracking,
    SessionLost,
}

impl From<TrackingState> for SessionState {
    fn from(state: TrackingState) -> Self {
        match state {
            TrackingState::Tracking => SessionState::SessionTracking,
            TrackingState::Paused => SessionState::SessionPaused,
            TrackingState::Lost => SessionState::SessionLost,
        }
    }
}

/// Transient user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    SceneSaved,
    SaveFailed(String),
    SceneLoaded(RestoreReport),
    LoadFailed(String),
    SceneCleared(usize),
    ModelLoaded(String),
    ModelFailed(String),
    LoadModelFirst,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::SceneSaved => f.write_str("Scene saved"),
            Notification::SaveFailed(_) => f.write_str("Failed to save scene"),
            Notification::SceneLoaded(_) => f.write_str("Scene loaded"),
            Notification::LoadFailed(_) => f.write_str("Failed to load scene"),
            Notification::SceneCleared(_) => f.write_str("Scene cleared"),
            Notification::ModelLoaded(name) => write!(f, "Loaded: {}", name),
            Notification::ModelFailed(reason) => write!(f, "Failed to load model: {}", reason),
            Notification::LoadModelFirst => f.write_str("Load a model first"),
        }
    }
}

/// What happened to the tap consumed this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    Placed(PlacedObjectId),
    Missed,
    NoModelSelected,
    Rejected(ErrorKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub state: SessionState,
    pub tap: Option<TapOutcome>,
    pub rendered: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub ticks: u64,
    pub frames_rendered: u64,
    pub placements: u64,
    pub last_interval: Duration,
}

pub struct FrameLoop<T, R, M>
where
    T: Tracker,
    R: Renderer,
    M: ModelRepository,
{
    ctx: Context,
    tracker: T,
    renderer: R,
    repository: M,
    scene: SceneGraph<M>,
    state: SessionState,
    // whether the host is delivering ticks (cleared while paused)
    ticking: bool,
    sender: EventSender,
    events: mpsc::Receiver<Event>,
    // received but not yet dispatched, oldest first
    inbound: VecDeque<Event>,
    pending_taps: VecDeque<ScreenPoint>,
    io: IoWorker,
    notifications: VecDeque<Notification>,
    stats: FrameStats,
    last_tick: Option<Instant>,
}

impl<T, R, M> FrameLoop<T, R, M>
where
    T: Tracker,
    R: Renderer,
    M: ModelRepository,
{
    /// Builds the engine. With `restore_on_start` a scene load is queued on
    /// the I/O worker right away.
    pub fn new(config: EngineConfig, tracker: T, renderer: R, repository: M) -> Result<Self> {
        config.validate().map_err(SceneError::Config)?;
        let mut io = IoWorker::new()?;
        if config.restore_on_start {
            io.load_scene(config.scene_path(), config.models_path());
        }
        let (sender, events) = mpsc::channel();
        Ok(Self {
            ctx: Context::new(config),
            tracker,
            renderer,
            repository,
            scene: SceneGraph::new(),
            state: SessionState::NoSession,
            ticking: false,
            sender: EventSender(sender),
            events,
            inbound: VecDeque::new(),
            pending_taps: VecDeque::new(),
            io,
            notifications: VecDeque::new(),
            stats: FrameStats::default(),
            last_tick: None,
        })
    }

    /// Establishes the tracking session on first call, then resumes tracking
    /// and tick delivery. A session that cannot be established is fatal.
    pub fn resume(&mut self) -> Result<()> {
        if self.state == SessionState::NoSession {
            self.tracker.start().map_err(|e| match e {
                SceneError::SessionUnavailable(_) => e,
                other => SceneError::SessionUnavailable(other.to_string()),
            })?;
            info!("tracking session established");
            self.set_state(SessionState::SessionPaused);
        }
        if let Err(e) = self.tracker.resume() {
            error!("camera not available on resume: {}", e);
        }
        self.ticking = true;
        self.last_tick = None;
        Ok(())
    }

    /// Pauses tracking and stops tick delivery. No ticks queue up meanwhile.
    pub fn pause(&mut self) {
        if self.state != SessionState::NoSession {
            self.tracker.pause();
            self.set_state(SessionState::SessionPaused);
        }
        self.ticking = false;
    }

    /// Runs one frame. Never re-entrant; the host calls it once per display
    /// refresh.
    pub fn tick(&mut self, frame_time_nanos: u64) -> TickReport {
        if !self.ticking {
            return self.report(None, false);
        }
        let now = Instant::now();
        if let Some(last) = self.last_tick.replace(now) {
            self.stats.last_interval = now - last;
        }
        self.stats.ticks += 1;
        trace!(
            "tick {} ({:?} since last)",
            self.stats.ticks, self.stats.last_interval
        );

        self.dispatch_events();
        self.apply_completions();

        let snapshot = match self.tracker.update(self.ctx.config.near, self.ctx.config.far) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("no tracking snapshot this tick: {}", e);
                return self.report(None, false);
            }
        };
        self.set_state(snapshot.state.into());
        if snapshot.state != TrackingState::Tracking {
            // pending taps wait for a tracking tick
            return self.report(None, false);
        }

        let tap = self
            .pending_taps
            .pop_front()
            .map(|point| self.handle_tap(point));

        let views = render::views_for(&self.ctx, &snapshot);
        let rendered = render::render_frame(&mut self.renderer, &views, frame_time_nanos);
        if rendered {
            self.stats.frames_rendered += 1;
        }
        self.report(tap, rendered)
    }

    /// Stops accepting I/O, lets queued tasks finish, then releases the scene
    /// and closes the tracking session. Hands the collaborators back.
    pub fn shutdown(mut self) -> (T, R, M) {
        self.ticking = false;
        for completion in self.io.shutdown() {
            match completion {
                Completion::Failed { task, error } => {
                    error!("{:?} failed during shutdown: {}", task, error)
                }
                other => debug!("dropping {:?} completion at shutdown", other.task()),
            }
        }
        if !self.inbound.is_empty() {
            debug!("dropping {} undispatched events at shutdown", self.inbound.len());
        }
        let FrameLoop {
            mut tracker,
            renderer,
            mut repository,
            scene,
            state,
            ..
        } = self;
        scene.release(&mut repository);
        if state != SessionState::NoSession {
            tracker.close();
        }
        info!("frame loop shut down");
        (tracker, renderer, repository)
    }

    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn push_event(&self, event: Event) -> bool {
        self.sender.send(event)
    }

    /// Blocks until the I/O worker has finished everything submitted so far.
    /// The results are applied on the next tick.
    pub fn wait_for_io(&mut self, timeout: Duration) -> bool {
        self.io.wait_idle(timeout)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    pub fn current_model_label(&self) -> String {
        match self.scene.selected_model() {
            Some(model) => format!("Current Model: {}", model.name),
            None => "No model loaded".to_string(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn scene(&self) -> &SceneGraph<M> {
        &self.scene
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn pending_taps(&self) -> usize {
        self.pending_taps.len()
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn repository(&self) -> &M {
        &self.repository
    }

    fn report(&self, tap: Option<TapOutcome>, rendered: bool) -> TickReport {
        TickReport {
            state: self.state,
            tap,
            rendered,
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            info!("session state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn notify(&mut self, notification: Notification) {
        debug!("notification: {}", notification);
        self.notifications.push_back(notification);
    }

    /// Dispatches inbound events in arrival order. A save waits, together
    /// with everything behind it, until an outstanding scene load has been
    /// applied, so it never captures the scene the load is about to replace.
    fn dispatch_events(&mut self) {
        self.inbound.extend(self.events.try_iter());
        while let Some(event) = self.inbound.pop_front() {
            if event == Event::SaveScene && self.io.is_pending(TaskKind::LoadScene) {
                debug!(
                    "holding save and {} later events until the scene load is applied",
                    self.inbound.len()
                );
                self.inbound.push_front(event);
                break;
            }
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::Tap(point) => self.pending_taps.push_back(point),
            Event::LoadModel(source) => {
                let models_dir = self.ctx.config.models_path();
                self.io.import_model(source, models_dir);
            }
            Event::NextModel => {
                self.scene.selection_next();
                debug!("{}", self.current_model_label());
            }
            Event::ToggleStereo => {
                let mode = self.ctx.toggle_render_mode();
                info!("render mode is now {:?}", mode);
            }
            Event::SaveScene => {
                let document = SceneDocument::capture(&self.scene);
                self.io.save_scene(document, self.ctx.config.scene_path());
            }
            Event::LoadScene => {
                self.io
                    .load_scene(self.ctx.config.scene_path(), self.ctx.config.models_path());
            }
            Event::ClearScene => {
                let removed = self.scene.clear_all(&mut self.repository);
                info!("cleared {} placed objects", removed);
                self.notify(Notification::SceneCleared(removed));
            }
            Event::SurfaceCreated { width, height } => self.ctx.resize(width, height),
            Event::SurfaceChanged { width, height } => {
                self.ctx.resize(width, height);
                self.tracker.set_display_geometry(width, height);
            }
            Event::SurfaceDestroyed => self.ctx.surface = None,
        }
    }

    fn apply_completions(&mut self) {
        for completion in self.io.drain() {
            self.apply(completion);
        }
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::ModelImported { name, bytes } => self.install_model(name, bytes),
            Completion::SceneSaved { path } => {
                info!("scene saved to {}", path.display());
                self.notify(Notification::SceneSaved);
            }
            Completion::SceneLoaded { document, assets } => {
                let report = document.restore(assets, &mut self.scene, &mut self.repository);
                info!(
                    "scene restored: {} models ({} skipped), {} objects ({} skipped)",
                    report.models_restored,
                    report.models_skipped,
                    report.objects_restored,
                    report.objects_skipped
                );
                self.notify(Notification::SceneLoaded(report));
            }
            Completion::NoPersistedScene => debug!("no persisted scene to restore"),
            Completion::Failed { task, error } => {
                error!("{:?} failed: {}", task, error);
                let reason = error.to_string();
                self.notify(match task {
                    TaskKind::ImportModel => Notification::ModelFailed(reason),
                    TaskKind::SaveScene => Notification::SaveFailed(reason),
                    TaskKind::LoadScene => Notification::LoadFailed(reason),
                });
            }
        }
    }

    /// Decodes (unless already loaded), registers and selects an imported
    /// model.
    fn install_model(&mut self, name: String, bytes: Vec<u8>) {
        let index = match self.scene.index_of(&name) {
            Some(index) => index,
            None => match self.repository.load_asset(&name, &bytes) {
                Ok(asset) => self.scene.add_model(&mut self.repository, &name, asset),
                Err(e) => {
                    error!("{}", e);
                    self.notify(Notification::ModelFailed(name));
                    return;
                }
            },
        };
        if let Err(e) = self.scene.select(index) {
            warn!("could not select `{}`: {}", name, e);
        }
        info!("loaded `{}` as model {}", name, index);
        self.notify(Notification::ModelLoaded(name));
    }

    fn handle_tap(&mut self, point: ScreenPoint) -> TapOutcome {
        let tracker = &mut self.tracker;
        let resolved = placement::resolve(&mut self.scene, &mut self.repository, || {
            tracker.hit_test(point)
        });
        match resolved {
            Ok(Placement::Placed(id)) => {
                self.stats.placements += 1;
                TapOutcome::Placed(id)
            }
            Ok(Placement::Missed) => TapOutcome::Missed,
            Err(SceneError::NoModelSelected) => {
                self.notify(Notification::LoadModelFirst);
                TapOutcome::NoModelSelected
            }
            Err(e) => {
                warn!("tap at ({}, {}) rejected: {}", point.x, point.y, e);
                TapOutcome::Rejected(e.kind())
            }
        }
    }
}

/// Installs `env_logger` unless a logger is already set.
pub fn init_logger() {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }
}

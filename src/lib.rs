//! mr-ngin
//!
//! A small mixed-reality scene composition engine. Virtual models are placed
//! onto real-world surfaces reported by a tracking session, rendered either
//! monocularly or as a side-by-side stereo pair, and persisted to a scene
//! document that can be restored later. Pose estimation, rasterization and
//! asset decoding are collaborators behind traits; the engine owns the scene
//! state, the per-tick control flow and the file I/O.
//!
//! High-level modules
//! - `config`: engine configuration (IPD, clip planes, data paths)
//! - `context`: per-session runtime state (surface, render mode)
//! - `data_structures`: poses, rigid transforms and the scene graph
//! - `error`: the shared error taxonomy
//! - `flow`: the frame loop state machine and its inbound event queue
//! - `io`: the sequential background I/O worker
//! - `placement`: tap resolution against hit-test results
//! - `render`: the renderer seam and per-frame pass composition
//! - `resources`: the model repository seam, glTF decoding and scene persistence
//! - `stereo`: eye view derivation for stereo output
//! - `tracking`: the tracker seam and its snapshot / hit types
//!

pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod io;
pub mod placement;
pub mod render;
pub mod resources;
pub mod stereo;
pub mod tracking;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use error::{ErrorKind, Result, SceneError};
pub use flow::{Event, FrameLoop, Notification, SessionState};

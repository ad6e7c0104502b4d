//! Engine data structures: placed-object transforms and the scene graph.
//!
//! - `instance` holds rigid poses and the row-major matrix conversions used by
//!   the scene document
//! - `scene_graph` owns the loaded models, the placed objects and the
//!   selection cursor

pub mod instance;
pub mod scene_graph;

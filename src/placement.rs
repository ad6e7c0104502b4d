//! Turns a screen tap plus hit-test results into a placed object.
//!
//! The first hit (in the tracker's nearest-first order) that lands inside a
//! plane polygon or on an oriented feature point wins. There is no scoring
//! and no second look at later hits.

use log::debug;

use crate::{
    data_structures::scene_graph::{PlacedObjectId, SceneGraph},
    error::{Result, SceneError},
    resources::ModelRepository,
    tracking::{HitResult, Trackable},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Placed(PlacedObjectId),
    /// No hit qualified. A routine miss, not an error.
    Missed,
}

pub fn qualifies(hit: &HitResult) -> bool {
    match hit.trackable {
        Trackable::Plane { contains_pose } => contains_pose,
        Trackable::Point {
            orientation_estimated,
        } => orientation_estimated,
    }
}

/// Resolves one tap against the current selection.
///
/// `hit_test` is only invoked when a model is selected, so a tap without a
/// selection never reaches the tracker. Fails with `NoModelSelected` in that
/// case; the tap is consumed either way.
pub fn resolve<R, F>(
    scene: &mut SceneGraph<R>,
    repository: &mut R,
    hit_test: F,
) -> Result<Placement>
where
    R: ModelRepository,
    F: FnOnce() -> Vec<HitResult>,
{
    let model_index = scene.selection().ok_or(SceneError::NoModelSelected)?;
    let hits = hit_test();
    match hits.iter().find(|hit| qualifies(hit)) {
        Some(hit) => {
            let id = scene.place_object(repository, model_index, hit.pose.to_matrix())?;
            debug!(
                "placed model {} as {:?} at {:?}",
                model_index, id, hit.pose.position
            );
            Ok(Placement::Placed(id))
        }
        None => {
            debug!("no qualifying hit among {} results", hits.len());
            Ok(Placement::Missed)
        }
    }
}

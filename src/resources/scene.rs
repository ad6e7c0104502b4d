//! Scene persistence.
//!
//! A [`SceneDocument`] lists model names in load order and every placed object
//! in placement order with its model index and a row-major 4x4 transform:
//!
//! ```json
//! {
//!   "version": 1,
//!   "models": ["chair.glb", "lamp.glb"],
//!   "placedObjects": [
//!     { "modelIndex": 0, "transform": [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1] }
//!   ]
//! }
//! ```
//!
//! Documents without a `version` field are read as version 1.
//!
//! Restoring is best effort: models whose files are gone are skipped, and so
//! is every placed object referring to them. Surviving models are renumbered
//! contiguously in document order (or reuse the index of an already loaded
//! model with the same name), and placed objects are remapped onto those new
//! indices.

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{
        instance::{RIGID_EPSILON, from_row_major, is_rigid, to_row_major},
        scene_graph::SceneGraph,
    },
    error::{Result, SceneError},
    resources::{ModelRepository, write_atomic},
};

pub const SCENE_VERSION: u32 = 1;

fn legacy_version() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub models: Vec<String>,
    pub placed_objects: Vec<PlacedEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedEntry {
    pub model_index: usize,
    /// Row-major.
    pub transform: [f32; 16],
}

/// What a restore managed to bring back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub models_restored: usize,
    pub models_skipped: usize,
    pub objects_restored: usize,
    pub objects_skipped: usize,
}

impl SceneDocument {
    /// Snapshot of the scene's models and placed objects, in order.
    pub fn capture<R: ModelRepository>(scene: &SceneGraph<R>) -> Self {
        Self {
            version: SCENE_VERSION,
            models: scene.model_names().map(str::to_string).collect(),
            placed_objects: scene
                .placed_objects()
                .iter()
                .map(|placed| PlacedEntry {
                    model_index: placed.model_index,
                    transform: to_row_major(&placed.transform),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a document.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: SceneDocument = serde_json::from_str(text)?;
        document.validate()?;
        Ok(document)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version == 0 || self.version > SCENE_VERSION {
            return Err(SceneError::Parse(format!(
                "unsupported scene version {} (expected at most {})",
                self.version, SCENE_VERSION
            )));
        }
        for (i, entry) in self.placed_objects.iter().enumerate() {
            if !is_rigid(&from_row_major(&entry.transform), RIGID_EPSILON) {
                return Err(SceneError::Parse(format!(
                    "placed object {} does not have a rigid transform",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Writes the document atomically: on failure the previous file survives.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        write_atomic(path, json.as_bytes()).await
    }

    /// `Ok(None)` when nothing was ever persisted at `path`.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::from_json(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Rebuilds models and placed objects into `scene`.
    ///
    /// `assets[i]` holds the file contents for `models[i]`, or `None` when the
    /// file could not be read. Must run on the frame tick.
    pub fn restore<R: ModelRepository>(
        &self,
        assets: Vec<Option<Vec<u8>>>,
        scene: &mut SceneGraph<R>,
        repository: &mut R,
    ) -> RestoreReport {
        let mut report = RestoreReport::default();
        let mut assets = assets.into_iter();
        let mut remap: Vec<Option<usize>> = Vec::with_capacity(self.models.len());

        for name in &self.models {
            let bytes = assets.next().flatten();
            let index = match (scene.index_of(name), bytes) {
                (Some(index), _) => Some(index),
                (None, Some(bytes)) => match repository.load_asset(name, &bytes) {
                    Ok(asset) => Some(scene.add_model(repository, name, asset)),
                    Err(e) => {
                        warn!("skipping model `{}`: {}", name, e);
                        None
                    }
                },
                (None, None) => {
                    debug!("skipping model `{}`: asset file is missing", name);
                    None
                }
            };
            match index {
                Some(_) => report.models_restored += 1,
                None => report.models_skipped += 1,
            }
            remap.push(index);
        }

        for entry in &self.placed_objects {
            let Some(model_index) = remap.get(entry.model_index).copied().flatten() else {
                report.objects_skipped += 1;
                continue;
            };
            match scene.place_object(repository, model_index, from_row_major(&entry.transform)) {
                Ok(_) => report.objects_restored += 1,
                Err(e) => {
                    warn!("skipping placed object of model {}: {}", entry.model_index, e);
                    report.objects_skipped += 1;
                }
            }
        }
        report
    }
}

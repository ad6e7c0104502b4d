//! Flat scene organization: loaded models and the objects placed from them.
//!
//! [`SceneGraph`] owns the authoritative, ordered lists of [`Model`]s and
//! [`PlacedObject`]s plus the selection cursor. Objects are never parented;
//! each placement gets its own renderer instance. Models are append-only for
//! the lifetime of a session so model indices stay valid everywhere they are
//! stored (placed objects, persisted documents).
//!
//! Structural mutation only ever happens on the frame tick.

use cgmath::Matrix4;
use log::debug;

use crate::{
    data_structures::instance::{RIGID_EPSILON, is_rigid},
    error::{Result, SceneError},
    resources::ModelRepository,
};

/// A loaded model. `name` is its unique key for deduplication and persistence.
#[derive(Debug)]
pub struct Model<A> {
    pub name: String,
    pub asset: A,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlacedObjectId(pub u64);

/// One placement of a model in world space.
#[derive(Debug)]
pub struct PlacedObject<I> {
    pub id: PlacedObjectId,
    pub model_index: usize,
    pub transform: Matrix4<f32>,
    pub instance: I,
}

pub struct SceneGraph<R: ModelRepository> {
    models: Vec<Model<R::Asset>>,
    placed: Vec<PlacedObject<R::Instance>>,
    selection: Option<usize>,
    next_id: u64,
}

impl<R: ModelRepository> SceneGraph<R> {
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            placed: Vec::new(),
            selection: None,
            next_id: 0,
        }
    }

    /// Appends a model and returns its index. Adding a name that is already
    /// loaded returns the existing index and hands the duplicate asset back
    /// to the repository for destruction.
    pub fn add_model(&mut self, repository: &mut R, name: &str, asset: R::Asset) -> usize {
        if let Some(index) = self.index_of(name) {
            debug!("model `{}` already loaded at index {}", name, index);
            repository.destroy_asset(asset);
            return index;
        }
        self.models.push(Model {
            name: name.to_string(),
            asset,
        });
        self.models.len() - 1
    }

    /// Creates a fresh instance of the model, sets its root transform and
    /// attaches it to the renderable scene. Transforms that are not rigid
    /// (scaled, sheared or non-finite) are rejected without touching the scene.
    pub fn place_object(
        &mut self,
        repository: &mut R,
        model_index: usize,
        transform: Matrix4<f32>,
    ) -> Result<PlacedObjectId> {
        let model = self
            .models
            .get(model_index)
            .ok_or(SceneError::InvalidReference {
                index: model_index,
                len: self.models.len(),
            })?;
        if !is_rigid(&transform, RIGID_EPSILON) {
            return Err(SceneError::InvalidTransform);
        }
        let instance = repository.create_instance(&model.asset)?;
        repository.set_root_transform(&instance, &transform);
        repository.attach(&instance);

        let id = PlacedObjectId(self.next_id);
        self.next_id += 1;
        self.placed.push(PlacedObject {
            id,
            model_index,
            transform,
            instance,
        });
        Ok(id)
    }

    /// Detaches and releases every placed object. Models stay loaded.
    /// Returns how many objects were removed.
    pub fn clear_all(&mut self, repository: &mut R) -> usize {
        let removed = self.placed.len();
        for placed in self.placed.drain(..) {
            repository.detach(&placed.instance);
            repository.release_instance(placed.instance);
        }
        removed
    }

    /// Advances the cursor modulo the model count; no-op without models.
    pub fn selection_next(&mut self) -> Option<usize> {
        if self.models.is_empty() {
            return self.selection;
        }
        let next = match self.selection {
            Some(current) => (current + 1) % self.models.len(),
            None => 0,
        };
        self.selection = Some(next);
        self.selection
    }

    pub fn select(&mut self, model_index: usize) -> Result<()> {
        if model_index >= self.models.len() {
            return Err(SceneError::InvalidReference {
                index: model_index,
                len: self.models.len(),
            });
        }
        self.selection = Some(model_index);
        Ok(())
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn selected_model(&self) -> Option<&Model<R::Asset>> {
        self.selection.and_then(|index| self.models.get(index))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|model| model.name == name)
    }

    pub fn models(&self) -> &[Model<R::Asset>] {
        &self.models
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|model| model.name.as_str())
    }

    pub fn placed_objects(&self) -> &[PlacedObject<R::Instance>] {
        &self.placed
    }

    /// Tears the whole scene down at shutdown: placed objects first, then
    /// every loaded asset.
    pub fn release(mut self, repository: &mut R) {
        self.clear_all(repository);
        for model in self.models.drain(..) {
            repository.destroy_asset(model.asset);
        }
    }
}

impl<R: ModelRepository> Default for SceneGraph<R> {
    fn default() -> Self {
        Self::new()
    }
}

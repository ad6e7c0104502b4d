//! glTF-backed model repository.
//!
//! Decodes `.gltf` / `.glb` bytes with the `gltf` crate and keeps the
//! bookkeeping a renderer needs: which entities exist, their root transforms
//! and which of them are attached to the renderable scene.

use std::collections::{HashMap, HashSet};

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    error::{Result, SceneError},
    resources::ModelRepository,
};

/// Opaque renderer entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

/// Decoded model geometry.
#[derive(Debug)]
pub struct GltfAsset {
    pub name: String,
    pub meshes: usize,
    pub nodes: usize,
}

/// Entities created for one placement. `root` carries the placement transform.
#[derive(Debug, PartialEq, Eq)]
pub struct EntityGroup {
    pub root: Entity,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Default)]
pub struct GltfRepository {
    next_entity: u32,
    transforms: HashMap<Entity, Matrix4<f32>>,
    scene: HashSet<Entity>,
    live_assets: usize,
}

impl GltfRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn create_entity(&mut self) -> Entity {
        let entity = Entity(self.next_entity);
        self.next_entity += 1;
        entity
    }

    pub fn root_transform(&self, group: &EntityGroup) -> Option<&Matrix4<f32>> {
        self.transforms.get(&group.root)
    }

    pub fn is_attached(&self, group: &EntityGroup) -> bool {
        group.entities.iter().all(|e| self.scene.contains(e))
    }

    /// Entities currently in the renderable scene.
    pub fn renderable_count(&self) -> usize {
        self.scene.len()
    }

    pub fn live_assets(&self) -> usize {
        self.live_assets
    }
}

impl ModelRepository for GltfRepository {
    type Asset = GltfAsset;
    type Instance = EntityGroup;

    fn load_asset(&mut self, name: &str, bytes: &[u8]) -> Result<GltfAsset> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| SceneError::AssetLoadFailure {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let asset = GltfAsset {
            name: name.to_string(),
            meshes: gltf.meshes().count(),
            nodes: gltf.nodes().count(),
        };
        log::info!(
            "decoded `{}`: {} meshes, {} nodes",
            asset.name,
            asset.meshes,
            asset.nodes
        );
        self.live_assets += 1;
        Ok(asset)
    }

    fn create_instance(&mut self, asset: &GltfAsset) -> Result<EntityGroup> {
        let root = self.create_entity();
        let mut entities = Vec::with_capacity(asset.nodes + 1);
        entities.push(root);
        for _ in 0..asset.nodes {
            let entity = self.create_entity();
            entities.push(entity);
        }
        self.transforms.insert(root, Matrix4::identity());
        Ok(EntityGroup { root, entities })
    }

    fn set_root_transform(&mut self, instance: &EntityGroup, transform: &Matrix4<f32>) {
        self.transforms.insert(instance.root, *transform);
    }

    fn attach(&mut self, instance: &EntityGroup) {
        self.scene.extend(instance.entities.iter().copied());
    }

    fn detach(&mut self, instance: &EntityGroup) {
        for entity in &instance.entities {
            self.scene.remove(entity);
        }
    }

    fn release_instance(&mut self, instance: EntityGroup) {
        self.transforms.remove(&instance.root);
    }

    fn destroy_asset(&mut self, asset: GltfAsset) {
        log::debug!("destroying asset `{}`", asset.name);
        self.live_assets = self.live_assets.saturating_sub(1);
    }
}

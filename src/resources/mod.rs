use std::path::{Path, PathBuf};

use cgmath::Matrix4;

use crate::error::{Result, SceneError};

/**
 * This module contains all logic for loading models and scene documents from
 * external files, and the repository seam the scene graph uses to turn decoded
 * bytes into renderable assets and instances.
 */
pub mod model;
pub mod scene;

/// Model repository collaborator: decodes assets and creates per-placement
/// instances owned by the renderer.
///
/// All calls happen on the frame tick. The I/O worker only ever produces bytes.
pub trait ModelRepository {
    /// Renderer-owned geometry for one loaded model.
    type Asset;
    /// Entity group plus root transform created for one placement.
    type Instance;

    fn load_asset(&mut self, name: &str, bytes: &[u8]) -> Result<Self::Asset>;

    /// Every call yields a fresh instance; instances are never shared.
    fn create_instance(&mut self, asset: &Self::Asset) -> Result<Self::Instance>;

    fn set_root_transform(&mut self, instance: &Self::Instance, transform: &Matrix4<f32>);

    /// Adds the instance's entities to the renderable scene.
    fn attach(&mut self, instance: &Self::Instance);

    /// Removes the instance's entities from the renderable scene.
    fn detach(&mut self, instance: &Self::Instance);

    fn release_instance(&mut self, instance: Self::Instance);

    fn destroy_asset(&mut self, asset: Self::Asset);
}

pub async fn load_binary(path: &Path) -> Result<Vec<u8>> {
    let data = tokio::fs::read(path).await?;
    Ok(data)
}

/// Copies `source` into `dir` under its own file name, creating `dir` if
/// needed. Returns the file name (the model's name key) and the destination.
pub async fn copy_into(source: &Path, dir: &Path) -> Result<(String, PathBuf)> {
    let name = source
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            SceneError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has no usable file name", source.display()),
            ))
        })?
        .to_string();
    tokio::fs::create_dir_all(dir).await?;
    let destination = dir.join(&name);
    if is_same_file(source, &destination).await {
        // copying a file onto itself truncates it
        log::debug!("{} is already in the models directory", source.display());
        return Ok((name, destination));
    }
    tokio::fs::copy(source, &destination).await?;
    Ok((name, destination))
}

async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Writes `bytes` next to `path` first and renames it into place, so readers
/// see either the previous file or the complete new one.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    let written = async {
        let mut file = tokio::fs::File::create(&staging).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        tokio::fs::rename(&staging, path).await
    }
    .await;
    if let Err(e) = written {
        // leave the previous document untouched
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    Ok(())
}

/// Model names come from persisted documents, so only bare file names are
/// resolved inside the models directory.
pub fn model_path(models_dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    match candidate.file_name() {
        Some(file_name) if file_name == candidate.as_os_str() => Some(models_dir.join(file_name)),
        _ => None,
    }
}

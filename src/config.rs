//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration. Paths are resolved relative to `data_dir`.
//!
//! ```toml
//! ipd = 0.064
//! near = 0.1
//! far = 100.0
//! data_dir = "/data/user/0/mrapp/files"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::stereo::DEFAULT_IPD;

pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 100.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interpupillary distance used for the stereo split.
    pub ipd: f32,
    pub near: f32,
    pub far: f32,
    pub data_dir: PathBuf,
    /// Directory (below `data_dir`) that imported model files are copied into.
    pub models_dir: PathBuf,
    /// Persisted scene document (below `data_dir`).
    pub scene_file: PathBuf,
    /// Queue a scene restore as soon as the engine is constructed.
    pub restore_on_start: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ipd: DEFAULT_IPD,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            data_dir: PathBuf::from("."),
            models_dir: PathBuf::from("models"),
            scene_file: PathBuf::from("scene.json"),
            restore_on_start: true,
        }
    }
}

impl EngineConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("invalid engine configuration")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not read configuration {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("could not parse configuration {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.ipd > 0.0) {
            return Err(format!("ipd must be positive, got {}", self.ipd));
        }
        if !(self.near > 0.0) {
            return Err(format!("near plane must be positive, got {}", self.near));
        }
        if !(self.far > self.near) {
            return Err(format!(
                "far plane ({}) must lie beyond the near plane ({})",
                self.far, self.near
            ));
        }
        Ok(())
    }

    pub fn models_path(&self) -> PathBuf {
        self.data_dir.join(&self.models_dir)
    }

    pub fn scene_path(&self) -> PathBuf {
        self.data_dir.join(&self.scene_file)
    }
}

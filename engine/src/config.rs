//! Configuration types for the engine
//!
//! Both types deserialize from JSON; every field is optional in the file and
//! falls back to its default.

use crate::graphics::{ModelFile, ModelLoadOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Errors that can occur while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid asset name: {0}")]
    InvalidName(String),
}

/// Where bare model names are looked up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root directory for all assets
    pub asset_root: PathBuf,
    /// Directory for OBJ models and their materials (relative to asset_root)
    pub models_dir: String,
}

impl AssetConfig {
    pub fn new(asset_root: PathBuf, models_dir: String) -> Self {
        Self {
            asset_root,
            models_dir,
        }
    }

    /// Path of the model called `name` (no extension) under the models directory
    pub fn model_path(&self, name: &str) -> Result<PathBuf, ConfigError> {
        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(ConfigError::InvalidName(name.to_string()));
        }
        let path = self
            .asset_root
            .join(&self.models_dir)
            .join(format!("{name}.obj"));
        debug!(name = name, path = ?path, "Resolved model name");
        Ok(path)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            models_dir: "models".to_string(),
        }
    }
}

/// Configuration for engine initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title
    pub window_title: String,
    /// Initial window size in physical pixels
    pub window_size: (u32, u32),
    /// OBJ file to load at startup, or the bare name of a model under the
    /// asset directory
    pub model: Option<PathBuf>,
    /// Directory material libraries are resolved against (defaults to the
    /// model's directory)
    pub material_dir: Option<PathBuf>,
    /// Split polygons into triangles while loading
    pub triangulate: bool,
    /// Link failures abort startup instead of being logged
    pub strict_shaders: bool,
    /// Framebuffer clear color (RGBA)
    pub clear_color: [f64; 4],
    /// Lookup location for bare model names
    pub asset_config: AssetConfig,
    /// Custom logging filter (None = default)
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_title: "Scene Viewer".to_string(),
            window_size: (800, 600),
            model: None,
            material_dir: None,
            triangulate: true,
            strict_shaders: false,
            clear_color: [1.0, 1.0, 1.0, 1.0],
            asset_config: AssetConfig::default(),
            log_filter: None,
        }
    }
}

impl EngineConfig {
    /// Read a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = ?path, "Loaded engine config");
        Ok(config)
    }

    /// Read `path` if it exists, otherwise use the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_json_file(path)
        } else {
            debug!(path = ?path, "No engine config found, using defaults");
            Ok(Self::default())
        }
    }

    /// The configured startup model, with its material directory override
    ///
    /// A value without directory or extension (`bunny`) names a model under
    /// [`AssetConfig`]; anything else is used as a path as is.
    pub fn model_file(&self) -> Result<Option<ModelFile>, ConfigError> {
        let Some(model) = &self.model else {
            return Ok(None);
        };
        let path = match model.to_str() {
            Some(name) if model.extension().is_none() && model.components().count() == 1 => {
                self.asset_config.model_path(name)?
            }
            _ => model.clone(),
        };
        let file = ModelFile::new(path);
        Ok(Some(match &self.material_dir {
            Some(dir) => file.with_base_dir(dir),
            None => file,
        }))
    }

    pub fn model_load_options(&self) -> ModelLoadOptions {
        ModelLoadOptions {
            triangulate: self.triangulate,
        }
    }
}

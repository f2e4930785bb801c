//! Loader configuration
//!
//! Parsed from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! asset_dir = "assets"
//! texture_dir = "textures"
//! max_asset_bytes = 67108864
//! load_metadata = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::LoadError;
use crate::formats::{MESH_EXT, META_EXT};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Root under which every asset has its own directory
    pub asset_dir: PathBuf,
    /// Texture directory inside an asset's directory
    pub texture_dir: String,
    /// Largest `.mesh` file the loader will decode
    pub max_asset_bytes: Option<u64>,
    /// Read the companion `.meta` file when present
    pub load_metadata: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            texture_dir: "textures".to_string(),
            max_asset_bytes: None,
            load_metadata: true,
        }
    }
}

impl LoaderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Directory holding one asset's files: `<asset_dir>/<name>`
    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.asset_dir.join(name)
    }

    /// `<asset_dir>/<name>/<name>.mesh`
    pub fn mesh_path(&self, name: &str) -> PathBuf {
        self.asset_path(name).join(format!("{name}.{MESH_EXT}"))
    }

    /// `<asset_dir>/<name>/<name>.meta`
    pub fn meta_path(&self, name: &str) -> PathBuf {
        self.asset_path(name).join(format!("{name}.{META_EXT}"))
    }

    /// `<asset_dir>/<name>/<texture_dir>`
    pub fn texture_path(&self, name: &str) -> PathBuf {
        self.asset_path(name).join(&self.texture_dir)
    }
}

//! Top-level asset loader.
//!
//! `ModelLoader::open("crate")` reads `assets/crate/crate.mesh`, resolves a
//! material per mesh, hands each mesh to the GPU uploader and reads the
//! optional `assets/crate/crate.meta`.
//!
//! Failure policy:
//! - structural stream errors abort the whole asset
//! - a material failure degrades that one mesh
//! - a metadata failure only drops the metadata

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::collaborators::{GpuUploader, MaterialRequest, MaterialResolver};
use crate::formats::{MeshRecord, ModelDecoder, Skeleton};
use crate::{LoadError, LoaderConfig, ModelMetadata};

/// Material outcome for one mesh
#[derive(Debug, Clone, PartialEq)]
pub enum MeshMaterial<M> {
    /// Shader and textures resolved
    Resolved(M),
    /// Textures failed; bare material on the same shader
    Fallback(M),
    /// Nothing could be resolved; the mesh is kept but not drawn
    Placeholder,
}

impl<M> MeshMaterial<M> {
    pub fn get(&self) -> Option<&M> {
        match self {
            Self::Resolved(m) | Self::Fallback(m) => Some(m),
            Self::Placeholder => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

/// A decoded mesh with its material and device buffers
#[derive(Debug)]
pub struct LoadedMesh<M, B> {
    pub record: MeshRecord,
    pub material: MeshMaterial<M>,
    pub buffers: B,
    pub visible: bool,
}

impl<M, B> LoadedMesh<M, B> {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.record.skeleton
    }

    /// Visible and carrying a usable material
    pub fn is_renderable(&self) -> bool {
        self.visible && !self.material.is_placeholder()
    }
}

/// A fully loaded asset
#[derive(Debug)]
pub struct LoadedModel<M, B> {
    pub name: String,
    pub meshes: Vec<LoadedMesh<M, B>>,
    /// `None` when the `.meta` file is absent, disabled or malformed
    pub metadata: Option<ModelMetadata>,
}

impl<M, B> LoadedModel<M, B> {
    pub fn mesh(&self, name: &str) -> Option<&LoadedMesh<M, B>> {
        self.meshes.iter().find(|m| m.name() == name)
    }
}

/// Loads `.mesh` assets using injected material and GPU capabilities
pub struct ModelLoader<'a, R, G> {
    config: LoaderConfig,
    materials: &'a mut R,
    gpu: &'a mut G,
}

impl<'a, R, G> ModelLoader<'a, R, G>
where
    R: MaterialResolver,
    G: GpuUploader,
{
    pub fn new(config: LoaderConfig, materials: &'a mut R, gpu: &'a mut G) -> Self {
        Self {
            config,
            materials,
            gpu,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load the asset stored under `<asset_dir>/<name>/`
    pub fn open(&mut self, name: &str) -> Result<LoadedModel<R::Material, G::Buffers>, LoadError> {
        let path = self.config.mesh_path(name);

        let file = File::open(&path).map_err(|source| LoadError::Open {
            path: path.clone(),
            source,
        })?;
        let size = file
            .metadata()
            .map_err(|source| LoadError::Open {
                path: path.clone(),
                source,
            })?
            .len();

        if let Some(limit) = self.config.max_asset_bytes.filter(|&limit| size > limit) {
            return Err(LoadError::TooLarge { path, size, limit });
        }

        let mut model = self.decode(name, &path, BufReader::new(file), size)?;

        if self.config.load_metadata {
            model.metadata = self.read_metadata(name);
        }

        tracing::info!("Loaded '{}': {} meshes", name, model.meshes.len());
        Ok(model)
    }

    /// Load an asset from an arbitrary stream.
    ///
    /// `source` is only used in error messages. No metadata is read.
    pub fn load_from_reader<S: Read>(
        &mut self,
        name: &str,
        source: &Path,
        reader: S,
    ) -> Result<LoadedModel<R::Material, G::Buffers>, LoadError> {
        let budget = self.config.max_asset_bytes.unwrap_or(u64::MAX);
        self.decode(name, source, reader, budget)
    }

    fn decode<S: Read>(
        &mut self,
        name: &str,
        path: &Path,
        reader: S,
        budget: u64,
    ) -> Result<LoadedModel<R::Material, G::Buffers>, LoadError> {
        let asset = ModelDecoder::new(reader, name)
            .with_budget(budget)
            .decode()
            .map_err(|source| LoadError::Format {
                path: path.to_path_buf(),
                source,
            })?;

        let texture_dir = self.config.texture_path(name);
        let meshes = asset
            .meshes
            .into_iter()
            .map(|record| {
                let material = self.resolve_material(&record, &texture_dir);
                let buffers = self.gpu.upload(&record);
                LoadedMesh {
                    record,
                    material,
                    buffers,
                    visible: true,
                }
            })
            .collect();

        Ok(LoadedModel {
            name: name.to_string(),
            meshes,
            metadata: None,
        })
    }

    fn resolve_material(
        &mut self,
        mesh: &MeshRecord,
        texture_dir: &Path,
    ) -> MeshMaterial<R::Material> {
        let request = MaterialRequest {
            shader: &mesh.shader,
            directory: texture_dir,
            name: &mesh.name,
        };

        match self.materials.resolve(&request) {
            Ok(material) => MeshMaterial::Resolved(material),
            Err(err) => {
                tracing::warn!("couldn't load material for mesh '{}': {}", mesh.name, err);
                match self.materials.fallback(&mesh.shader) {
                    Some(material) => MeshMaterial::Fallback(material),
                    None => {
                        tracing::warn!(
                            "couldn't find shader '{}', mesh '{}' will not be drawn",
                            mesh.shader,
                            mesh.name
                        );
                        MeshMaterial::Placeholder
                    }
                }
            }
        }
    }

    fn read_metadata(&self, name: &str) -> Option<ModelMetadata> {
        let path = self.config.meta_path(name);
        if !path.exists() {
            tracing::debug!("no metadata at {}", path.display());
            return None;
        }
        match ModelMetadata::load(&path) {
            Ok(meta) => Some(meta),
            Err(err) => {
                tracing::warn!("ignoring metadata {}: {}", path.display(), err);
                None
            }
        }
    }
}

//! Capabilities the loader borrows from the rendering side.
//!
//! Shader lookup, texture loading and buffer creation are not part of the
//! format. The loader receives them as trait objects so it can run without a
//! GPU or a process-wide shader registry.

use std::path::Path;

use crate::formats::MeshRecord;

/// Everything a material lookup needs for one mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialRequest<'a> {
    /// Shader name from the stream (already defaulted)
    pub shader: &'a str,
    /// Texture directory of the asset
    pub directory: &'a Path,
    /// Mesh name, used as the texture base name
    pub name: &'a str,
}

/// Resolves materials for decoded meshes
pub trait MaterialResolver {
    type Material;
    type Error: std::fmt::Display;

    /// Full material: shader plus textures
    fn resolve(&mut self, request: &MaterialRequest<'_>) -> Result<Self::Material, Self::Error>;

    /// Bare, textureless material for a shader, used when `resolve` fails.
    ///
    /// `None` when the shader itself is unknown.
    fn fallback(&mut self, _shader: &str) -> Option<Self::Material> {
        None
    }
}

/// Creates device buffers for a fully parsed mesh.
///
/// Allocation failures are the uploader's concern; the loader neither
/// retries nor inspects them.
pub trait GpuUploader {
    type Buffers;

    fn upload(&mut self, mesh: &MeshRecord) -> Self::Buffers;
}

/// No-op collaborator for tooling and tests: every material resolves to the
/// shader name, no buffers are created.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl MaterialResolver for Headless {
    type Material = String;
    type Error = std::convert::Infallible;

    fn resolve(&mut self, request: &MaterialRequest<'_>) -> Result<String, Self::Error> {
        Ok(request.shader.to_string())
    }
}

impl GpuUploader for Headless {
    type Buffers = ();

    fn upload(&mut self, _mesh: &MeshRecord) {}
}
